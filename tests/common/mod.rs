#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;

use turtlescan::domain::error::TurtlescanError;
pub use turtlescan::domain::ohlcv::Bar;
use turtlescan::domain::schema::IndicatorSchema;
use turtlescan::domain::series::EnrichedSeries;
use turtlescan::ports::data_port::{LiveQuote, MarketDataPort};
use turtlescan::ports::signal_log_port::SignalLogPort;
use turtlescan::ports::store_port::SeriesStorePort;

pub struct MockProvider {
    pub history: HashMap<String, Vec<Bar>>,
    pub quotes: HashMap<String, LiveQuote>,
    pub errors: HashMap<String, String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            history: HashMap::new(),
            quotes: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_history(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.history.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_quote(mut self, symbol: &str, price: f64, day_high: f64, day_low: f64) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            LiveQuote {
                price,
                day_high,
                day_low,
            },
        );
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockProvider {
    fn fetch_history(&self, symbol: &str) -> Result<Vec<Bar>, TurtlescanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TurtlescanError::Provider {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.history.get(symbol).cloned().unwrap_or_default())
    }

    fn fetch_quote(&self, symbol: &str) -> Result<LiveQuote, TurtlescanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TurtlescanError::Provider {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        self.quotes
            .get(symbol)
            .copied()
            .ok_or_else(|| TurtlescanError::Provider {
                symbol: symbol.to_string(),
                reason: "no quote".into(),
            })
    }
}

pub struct MemoryStore {
    pub series: Mutex<HashMap<String, EnrichedSeries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            series: Mutex::new(HashMap::new()),
        }
    }

    pub fn seeded(series: Vec<EnrichedSeries>) -> Self {
        let store = Self::new();
        for s in series {
            store.series.lock().unwrap().insert(s.symbol.clone(), s);
        }
        store
    }

    pub fn get(&self, symbol: &str) -> Option<EnrichedSeries> {
        self.series.lock().unwrap().get(symbol).cloned()
    }
}

impl SeriesStorePort for MemoryStore {
    fn load(&self, symbol: &str) -> Result<Option<EnrichedSeries>, TurtlescanError> {
        Ok(self.series.lock().unwrap().get(symbol).cloned())
    }

    fn save(&self, series: &EnrichedSeries) -> Result<(), TurtlescanError> {
        self.series
            .lock()
            .unwrap()
            .insert(series.symbol.clone(), series.clone());
        Ok(())
    }

    fn list_stored(&self) -> Result<Vec<String>, TurtlescanError> {
        let mut symbols: Vec<String> = self.series.lock().unwrap().keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub struct MemorySignalLog {
    pub lines: Mutex<Vec<String>>,
}

impl MemorySignalLog {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn contents(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl SignalLogPort for MemorySignalLog {
    fn append(&self, line: &str) -> Result<(), TurtlescanError> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(day: NaiveDate, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        date: day,
        open: close,
        high,
        low,
        close,
        volume: 1000,
    }
}

/// Deterministic wiggly walk: enough variation to exercise windows, gaps
/// and the ATR recursion without randomness.
pub fn generate_bars(start: NaiveDate, count: usize, base_price: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let drift = ((i * 7) % 13) as f64 - ((i * 5) % 9) as f64;
            let close = base_price + drift;
            Bar {
                date: start + Duration::days(i as i64),
                open: close - 0.25,
                high: close + 1.0 + ((i * 3) % 5) as f64,
                low: close - 1.0 - ((i * 2) % 4) as f64,
                close,
                volume: 10_000 + i as i64,
            }
            .normalized()
        })
        .collect()
}

pub fn small_schema() -> IndicatorSchema {
    IndicatorSchema {
        atr_periods: vec![3, 20],
        ma_periods: vec![2, 4],
        high_periods: vec![3, 10],
        low_periods: vec![3],
    }
}

pub fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
