//! True Range: the day's range widened by any gap from the prior close.

use crate::domain::indicator::round4;
use crate::domain::ohlcv::Bar;

/// TR[0] = High - Low; TR[i>0] = max(H-L, |H-C_prev|, |L-C_prev|).
pub fn true_range_at(bars: &[Bar], index: usize) -> f64 {
    let bar = &bars[index];
    if index == 0 {
        return round4(bar.high - bar.low);
    }
    round4(bar.true_range(bars[index - 1].close))
}
