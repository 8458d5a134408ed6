//! Daily OHLCV bar representation.

use chrono::NaiveDate;

use crate::domain::indicator::round4;

/// One trading day's open/high/low/close/volume for a single instrument.
///
/// Bars are owned by exactly one instrument's series; the symbol lives on
/// the series, not on the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Price fields rounded to 4 decimal places, the precision everything
    /// downstream (including the persisted form) carries.
    pub fn normalized(mut self) -> Self {
        self.open = round4(self.open);
        self.high = round4(self.high);
        self.low = round4(self.low);
        self.close = round4(self.close);
        self
    }
}
