//! Trailing simple moving average of Close.

use crate::domain::indicator::{round4, trailing_window};
use crate::domain::ohlcv::Bar;

/// MA-D[i]: mean of Close over the trailing min(D, i+1) bars, rounded.
///
/// Summation is left-to-right over the window so the batch and incremental
/// paths produce bit-identical values for the same bars.
pub fn moving_average_at(bars: &[Bar], index: usize, period: usize) -> f64 {
    let window = trailing_window(index, period);
    let span = window.len();
    let sum: f64 = bars[window].iter().map(|b| b.close).sum();
    round4(sum / span as f64)
}
