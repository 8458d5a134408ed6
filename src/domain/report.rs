//! Snapshot rows and the signal-log line contract.

use chrono::NaiveDate;

use crate::domain::error::TurtlescanError;
use crate::domain::series::EnrichedSeries;
use crate::domain::signals::{self, STOP_LOSS_ATR_PERIOD};
use crate::ports::data_port::LiveQuote;

/// One instrument's breakout information row: where price stands relative
/// to the rolling-high ladder, plus the derived stop level.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSnapshot {
    pub as_of: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub current_price: f64,
    /// (window, rolling high at the last index), in schema order.
    pub n_days_highs: Vec<(usize, f64)>,
    pub bullish: bool,
    pub atr_20: f64,
    pub stop_loss: f64,
}

/// Build a snapshot from the stored series and, when quoting live, the
/// current intraday quote. Without a quote the last close stands in for the
/// current price.
pub fn build_snapshot(
    series: &EnrichedSeries,
    quote: Option<&LiveQuote>,
    as_of: NaiveDate,
) -> Result<TickerSnapshot, TurtlescanError> {
    let last_bar = series
        .last_bar()
        .ok_or_else(|| TurtlescanError::DataUnavailable {
            symbol: series.symbol.clone(),
        })?;
    let last = series.len() - 1;

    let current_price = match quote {
        Some(q) => q.price,
        None => last_bar.close,
    };

    let mut n_days_highs = Vec::with_capacity(series.schema.high_periods.len());
    for &period in &series.schema.high_periods {
        n_days_highs.push((period, series.high_column(period)?[last]));
    }

    let atr_20 = series.atr_column(STOP_LOSS_ATR_PERIOD)?[last];

    Ok(TickerSnapshot {
        as_of,
        symbol: series.symbol.clone(),
        open: last_bar.open,
        high: last_bar.high,
        low: last_bar.low,
        close: last_bar.close,
        current_price,
        n_days_highs,
        bullish: signals::bullish_at_latest(series)?,
        atr_20,
        stop_loss: signals::stop_loss(current_price, atr_20),
    })
}

/// `20-days high`, `55-days high`, … — the label in front of every breakout
/// log line.
pub fn breakout_label(n_days: usize) -> String {
    format!("{n_days}-days high")
}

/// The breakout line the external log viewer parses. Exact form:
/// `[<stamp>] <label> breakout tickers: T1, T2 (count: N)`.
pub fn breakout_line(stamp: &str, label: &str, tickers: &[String]) -> String {
    format!(
        "[{stamp}] {label} breakout tickers: {} (count: {})",
        tickers.join(", "),
        tickers.len()
    )
}

/// The market-closed line, same consumer, same exactness requirement.
pub fn market_closed_line(stamp: &str) -> String {
    format!("[{stamp}] Market is closed, no breakout check performed")
}
