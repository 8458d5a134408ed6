//! Instrument universe from watchlist CSV files.
//!
//! Every CSV in the tickers directory contributes its `Ticker` column; the
//! universe is the sorted union. A missing directory or an unreadable file
//! is fatal — without a universe there is nothing to run against.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::domain::error::TurtlescanError;
use crate::domain::universe::merge_symbol_lists;
use crate::ports::universe_port::UniversePort;

pub struct FileUniverseAdapter {
    tickers_path: PathBuf,
}

impl FileUniverseAdapter {
    pub fn new(tickers_path: PathBuf) -> Self {
        Self { tickers_path }
    }

    fn universe_error(&self, reason: impl Into<String>) -> TurtlescanError {
        TurtlescanError::Universe {
            reason: reason.into(),
        }
    }
}

impl UniversePort for FileUniverseAdapter {
    fn list_instruments(&self) -> Result<Vec<String>, TurtlescanError> {
        let entries = fs::read_dir(&self.tickers_path).map_err(|e| {
            self.universe_error(format!(
                "failed to read {}: {e}",
                self.tickers_path.display()
            ))
        })?;

        let mut lists = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.universe_error(format!("directory entry error: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }

            let content = fs::read_to_string(&path).map_err(|e| {
                self.universe_error(format!("failed to read {}: {e}", path.display()))
            })?;
            let mut reader = csv::Reader::from_reader(content.as_bytes());

            let ticker_index = reader
                .headers()
                .map_err(|e| self.universe_error(format!("CSV header error in {}: {e}", path.display())))?
                .iter()
                .position(|h| h == "Ticker")
                .ok_or_else(|| {
                    self.universe_error(format!("no Ticker column in {}", path.display()))
                })?;

            let mut symbols = Vec::new();
            for record in reader.records() {
                let record = record.map_err(|e| {
                    self.universe_error(format!("CSV parse error in {}: {e}", path.display()))
                })?;
                if let Some(symbol) = record.get(ticker_index) {
                    let symbol = symbol.trim();
                    if !symbol.is_empty() {
                        symbols.push(symbol.to_uppercase());
                    }
                }
            }
            info!(file = %path.display(), count = symbols.len(), "watchlist loaded");
            lists.push(symbols);
        }

        Ok(merge_symbol_lists(&lists))
    }
}
