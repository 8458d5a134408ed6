//! File-drop market-data provider.
//!
//! The external feed drops raw OHLCV history as `<SYMBOL>.csv` files in one
//! directory and current quotes as rows of a single quotes CSV. This
//! adapter is the blocking, unreliable edge: every failure surfaces as a
//! `Provider` error for that one symbol.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::TurtlescanError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::{LiveQuote, MarketDataPort};

pub struct CsvProviderAdapter {
    history_path: PathBuf,
    quotes_path: PathBuf,
}

impl CsvProviderAdapter {
    pub fn new(history_path: PathBuf, quotes_path: PathBuf) -> Self {
        Self {
            history_path,
            quotes_path,
        }
    }

    fn provider_error(symbol: &str, reason: impl Into<String>) -> TurtlescanError {
        TurtlescanError::Provider {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

impl MarketDataPort for CsvProviderAdapter {
    fn fetch_history(&self, symbol: &str) -> Result<Vec<Bar>, TurtlescanError> {
        let path = self.history_path.join(format!("{symbol}.csv"));
        let content = fs::read_to_string(&path)
            .map_err(|e| Self::provider_error(symbol, format!("failed to read {}: {e}", path.display())))?;

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for record in reader.records() {
            let record = record
                .map_err(|e| Self::provider_error(symbol, format!("CSV parse error: {e}")))?;

            let field = |i: usize, name: &str| {
                record
                    .get(i)
                    .ok_or_else(|| Self::provider_error(symbol, format!("missing {name} column")))
            };

            let date = NaiveDate::parse_from_str(field(0, "date")?, "%Y-%m-%d")
                .map_err(|e| Self::provider_error(symbol, format!("invalid date: {e}")))?;
            let open = parse_price(symbol, "open", field(1, "open")?)?;
            let high = parse_price(symbol, "high", field(2, "high")?)?;
            let low = parse_price(symbol, "low", field(3, "low")?)?;
            let close = parse_price(symbol, "close", field(4, "close")?)?;
            let volume: i64 = field(5, "volume")?
                .parse()
                .map_err(|e| Self::provider_error(symbol, format!("invalid volume: {e}")))?;

            bars.push(
                Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume,
                }
                .normalized(),
            );
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_quote(&self, symbol: &str) -> Result<LiveQuote, TurtlescanError> {
        let content = fs::read_to_string(&self.quotes_path).map_err(|e| {
            Self::provider_error(
                symbol,
                format!("failed to read {}: {e}", self.quotes_path.display()),
            )
        })?;

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        for record in reader.records() {
            let record = record
                .map_err(|e| Self::provider_error(symbol, format!("CSV parse error: {e}")))?;
            if record.get(0) != Some(symbol) {
                continue;
            }

            let price = parse_price(symbol, "price", record.get(1).unwrap_or_default())?;
            // absent intraday extremes fall back to the last trade price
            let day_high = match record.get(2) {
                Some(raw) if !raw.is_empty() => parse_price(symbol, "day_high", raw)?,
                _ => price,
            };
            let day_low = match record.get(3) {
                Some(raw) if !raw.is_empty() => parse_price(symbol, "day_low", raw)?,
                _ => price,
            };
            return Ok(LiveQuote {
                price,
                day_high,
                day_low,
            });
        }

        Err(Self::provider_error(symbol, "no quote available"))
    }
}

fn parse_price(symbol: &str, column: &str, raw: &str) -> Result<f64, TurtlescanError> {
    raw.parse().map_err(|e| TurtlescanError::Provider {
        symbol: symbol.to_string(),
        reason: format!("invalid {column} value `{raw}`: {e}"),
    })
}
