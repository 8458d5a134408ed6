//! CSV-file enriched-series store.
//!
//! One `<SYMBOL>.csv` per instrument under a base directory, columns in the
//! documented fixed order. Saves are atomic: the file is written to a
//! temporary sibling and renamed over the destination, so the external
//! dashboard reading the same file never observes a partial write.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::TurtlescanError;
use crate::domain::ohlcv::Bar;
use crate::domain::schema::IndicatorSchema;
use crate::domain::series::EnrichedSeries;
use crate::ports::store_port::SeriesStorePort;

const BASE_COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

pub struct CsvStoreAdapter {
    base_path: PathBuf,
    schema: IndicatorSchema,
}

impl CsvStoreAdapter {
    pub fn new(base_path: PathBuf, schema: IndicatorSchema) -> Self {
        Self { base_path, schema }
    }

    fn series_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        header.extend(self.schema.column_names());
        header
    }

    fn malformed(symbol: &str, reason: impl Into<String>) -> TurtlescanError {
        TurtlescanError::Computation {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

impl SeriesStorePort for CsvStoreAdapter {
    fn load(&self, symbol: &str) -> Result<Option<EnrichedSeries>, TurtlescanError> {
        let path = self.series_path(symbol);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let header: Vec<String> = reader
            .headers()
            .map_err(|e| Self::malformed(symbol, format!("CSV header error: {e}")))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let expected = self.header();
        if header != expected {
            return Err(Self::malformed(
                symbol,
                format!("unexpected columns: {}", header.join(",")),
            ));
        }

        let mut series = EnrichedSeries::empty(symbol.to_string(), self.schema.clone());
        for record in reader.records() {
            let record =
                record.map_err(|e| Self::malformed(symbol, format!("CSV parse error: {e}")))?;
            if record.len() != expected.len() {
                return Err(Self::malformed(
                    symbol,
                    format!("row has {} fields, expected {}", record.len(), expected.len()),
                ));
            }

            let mut fields = record.iter();
            let mut next_field = |name: &str| {
                fields
                    .next()
                    .ok_or_else(|| Self::malformed(symbol, format!("missing {name} field")))
            };

            let date_str = next_field("Date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| Self::malformed(symbol, format!("invalid date: {e}")))?;
            let open = parse_number(symbol, "Open", next_field("Open")?)?;
            let high = parse_number(symbol, "High", next_field("High")?)?;
            let low = parse_number(symbol, "Low", next_field("Low")?)?;
            let close = parse_number(symbol, "Close", next_field("Close")?)?;
            let volume: i64 = next_field("Volume")?
                .parse()
                .map_err(|e| Self::malformed(symbol, format!("invalid Volume: {e}")))?;

            series.bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });

            series
                .true_range
                .push(parse_number(symbol, "True Range", next_field("True Range")?)?);
            for &period in &self.schema.atr_periods {
                let value = parse_number(symbol, "ATR", next_field("ATR")?)?;
                series.atr.entry(period).or_default().push(value);
            }
            for &period in &self.schema.ma_periods {
                let value = parse_number(symbol, "MA", next_field("MA")?)?;
                series.ma.entry(period).or_default().push(value);
            }
            for &period in &self.schema.high_periods {
                let value = parse_number(symbol, "Days High", next_field("Days High")?)?;
                series.n_days_high.entry(period).or_default().push(value);
            }
            for &period in &self.schema.low_periods {
                let value = parse_number(symbol, "Days Low", next_field("Days Low")?)?;
                series.n_days_low.entry(period).or_default().push(value);
            }

            let bullish = match next_field("Bullish")? {
                "true" => true,
                "false" => false,
                other => {
                    return Err(Self::malformed(
                        symbol,
                        format!("invalid Bullish value: {other}"),
                    ));
                }
            };
            series.bullish.push(bullish);
        }

        series.validate()?;
        Ok(Some(series))
    }

    fn save(&self, series: &EnrichedSeries) -> Result<(), TurtlescanError> {
        fs::create_dir_all(&self.base_path)?;
        let final_path = self.series_path(&series.symbol);
        let tmp_path = self.base_path.join(format!("{}.csv.tmp", series.symbol));

        let mut writer = csv::Writer::from_path(&tmp_path)
            .map_err(|e| Self::malformed(&series.symbol, format!("CSV open error: {e}")))?;
        writer
            .write_record(self.header())
            .map_err(|e| Self::malformed(&series.symbol, format!("CSV write error: {e}")))?;

        for index in 0..series.len() {
            let bar = &series.bars[index];
            let mut row = vec![
                bar.date.format("%Y-%m-%d").to_string(),
                format_number(bar.open),
                format_number(bar.high),
                format_number(bar.low),
                format_number(bar.close),
                bar.volume.to_string(),
                format_number(series.true_range[index]),
            ];
            for &period in &self.schema.atr_periods {
                row.push(format_number(series.atr_column(period)?[index]));
            }
            for &period in &self.schema.ma_periods {
                row.push(format_number(series.ma_column(period)?[index]));
            }
            for &period in &self.schema.high_periods {
                row.push(format_number(series.high_column(period)?[index]));
            }
            for &period in &self.schema.low_periods {
                row.push(format_number(series.low_column(period)?[index]));
            }
            row.push(series.bullish[index].to_string());

            writer
                .write_record(&row)
                .map_err(|e| Self::malformed(&series.symbol, format!("CSV write error: {e}")))?;
        }

        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    fn list_stored(&self) -> Result<Vec<String>, TurtlescanError> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

/// Numbers are persisted at exactly 4 decimal places. Parsing that form
/// back yields the identical f64, which is what keeps the incremental path
/// bit-consistent across process restarts.
fn format_number(value: f64) -> String {
    format!("{value:.4}")
}

fn parse_number(symbol: &str, column: &str, raw: &str) -> Result<f64, TurtlescanError> {
    raw.parse()
        .map_err(|e| TurtlescanError::Computation {
            symbol: symbol.to_string(),
            reason: format!("invalid {column} value `{raw}`: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::enrich;
    use crate::domain::update::extend;
    use chrono::Duration;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_bars(count: usize) -> Vec<Bar> {
        (0..count)
            .map(|i| {
                let close = 100.0 + ((i * 13) % 17) as f64 * 0.37;
                Bar {
                    date: date(2024, 1, 1) + Duration::days(i as i64),
                    open: close - 0.1234,
                    high: close + 1.4142,
                    low: close - 1.7321,
                    close,
                    volume: 10_000 + i as i64,
                }
                .normalized()
            })
            .collect()
    }

    fn small_schema() -> IndicatorSchema {
        IndicatorSchema {
            atr_periods: vec![3],
            ma_periods: vec![2, 4],
            high_periods: vec![3],
            low_periods: vec![3],
        }
    }

    #[test]
    fn round_trip_is_exact() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvStoreAdapter::new(dir.path().to_path_buf(), small_schema());

        let series = enrich("AAPL", &make_bars(12), &small_schema()).unwrap();
        adapter.save(&series).unwrap();
        let loaded = adapter.load("AAPL").unwrap().unwrap();

        assert_eq!(loaded, series);
    }

    #[test]
    fn missing_symbol_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvStoreAdapter::new(dir.path().to_path_buf(), small_schema());
        assert!(adapter.load("NOPE").unwrap().is_none());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvStoreAdapter::new(dir.path().to_path_buf(), small_schema());

        let series = enrich("AAPL", &make_bars(5), &small_schema()).unwrap();
        adapter.save(&series).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["AAPL.csv"]);
    }

    #[test]
    fn header_mismatch_is_computation_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvStoreAdapter::new(dir.path().to_path_buf(), small_schema());

        fs::write(
            dir.path().join("BAD.csv"),
            "Date,Open,High,Low,Close\n2024-01-01,1,2,0.5,1.5\n",
        )
        .unwrap();

        let err = adapter.load("BAD").unwrap_err();
        assert!(matches!(err, TurtlescanError::Computation { .. }));
    }

    #[test]
    fn garbage_number_is_computation_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvStoreAdapter::new(dir.path().to_path_buf(), small_schema());

        let series = enrich("AAPL", &make_bars(3), &small_schema()).unwrap();
        adapter.save(&series).unwrap();

        let path = dir.path().join("AAPL.csv");
        let corrupted = fs::read_to_string(&path).unwrap().replace("10000", "oops");
        fs::write(&path, corrupted).unwrap();

        let err = adapter.load("AAPL").unwrap_err();
        assert!(matches!(err, TurtlescanError::Computation { .. }));
    }

    #[test]
    fn extend_after_reload_matches_full_recomputation() {
        let dir = TempDir::new().unwrap();
        let schema = small_schema();
        let adapter = CsvStoreAdapter::new(dir.path().to_path_buf(), schema.clone());

        let bars = make_bars(20);
        let head = enrich("AAPL", &bars[..8], &schema).unwrap();
        adapter.save(&head).unwrap();

        // a later process loads the persisted series and extends it
        let reloaded = adapter.load("AAPL").unwrap().unwrap();
        let extended = extend(reloaded, &bars[7..], date(2025, 6, 2)).unwrap();

        let full = enrich("AAPL", &bars, &schema).unwrap();
        assert_eq!(extended, full);
    }

    #[test]
    fn list_stored_sorts_symbols() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvStoreAdapter::new(dir.path().to_path_buf(), small_schema());

        for symbol in ["MSFT", "AAPL"] {
            let series = enrich(symbol, &make_bars(4), &small_schema()).unwrap();
            adapter.save(&series).unwrap();
        }

        assert_eq!(adapter.list_stored().unwrap(), vec!["AAPL", "MSFT"]);
    }
}
