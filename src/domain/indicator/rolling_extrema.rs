//! Trailing n-day extrema of High and Low.

use crate::domain::indicator::{round4, trailing_window};
use crate::domain::ohlcv::Bar;

/// Maximum High over the trailing min(period, i+1) bars ending at `index`.
pub fn n_days_high_at(bars: &[Bar], index: usize, period: usize) -> f64 {
    let window = trailing_window(index, period);
    round4(
        bars[window]
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max),
    )
}

/// Minimum Low over the trailing min(period, i+1) bars ending at `index`.
pub fn n_days_low_at(bars: &[Bar], index: usize, period: usize) -> f64 {
    let window = trailing_window(index, period);
    round4(
        bars[window]
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min),
    )
}
