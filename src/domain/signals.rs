//! Per-instrument signal primitives.
//!
//! Pure predicates over one enriched series (plus, for live rules, one
//! quoted price). The cross-sectional wrappers live in [`crate::domain::scan`].

use crate::domain::error::TurtlescanError;
use crate::domain::indicator::bullish::bullish_arrangement;
use crate::domain::indicator::round4;
use crate::domain::series::EnrichedSeries;

/// Which bar the n-day reference window may see.
///
/// `Historical` confirms a breakout that is already on record: the last
/// stored bar is the reference and the window excludes it. `Live` compares
/// an intraday quote against a window that includes the last stored bar.
/// The two conventions are deliberately named rather than mixed silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMode {
    Historical,
    Live,
}

/// ATR window and multiplier behind the derived stop level.
pub const STOP_LOSS_ATR_PERIOD: usize = 20;
pub const STOP_LOSS_ATR_MULTIPLIER: f64 = 2.0;

/// Live rule: does `price` strictly exceed the trailing min(n, len)-day
/// high (last stored bar included)? Equality does not qualify.
pub fn breaks_n_days_high(series: &EnrichedSeries, n_days: usize, price: f64) -> bool {
    if series.is_empty() || n_days == 0 {
        return false;
    }
    let len = series.len();
    let span = n_days.min(len);
    let window_max = series.bars[len - span..]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    price > window_max
}

/// Live mirror rule for exits: does `price` strictly undercut the trailing
/// min(n, len)-day low?
pub fn breaks_n_days_low(series: &EnrichedSeries, n_days: usize, price: f64) -> bool {
    if series.is_empty() || n_days == 0 {
        return false;
    }
    let len = series.len();
    let span = n_days.min(len);
    let window_min = series.bars[len - span..]
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);
    price < window_min
}

/// Historical rule: did the last recorded High strictly exceed the n-day
/// high of the n bars before it? Needs n+1 bars of history; anything
/// shorter is simply not a breakout.
pub fn historical_breakout(series: &EnrichedSeries, n_days: usize) -> bool {
    let len = series.len();
    if n_days == 0 || len < n_days + 1 {
        return false;
    }
    let last = len - 1;
    let window_max = series.bars[last - n_days..last]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    series.bars[last].high > window_max
}

/// Bullish arrangement at the last stored index: the MA chain, in schema
/// order, strictly descending.
pub fn bullish_at_latest(series: &EnrichedSeries) -> Result<bool, TurtlescanError> {
    if series.is_empty() {
        return Err(TurtlescanError::DataUnavailable {
            symbol: series.symbol.clone(),
        });
    }
    let last = series.len() - 1;
    let mut row_mas = Vec::with_capacity(series.schema.ma_periods.len());
    for &period in &series.schema.ma_periods {
        row_mas.push(series.ma_column(period)?[last]);
    }
    Ok(bullish_arrangement(&row_mas))
}

/// Did the short MA close above the long MA today after closing below it
/// yesterday?
pub fn ma_crossover(
    series: &EnrichedSeries,
    short_period: usize,
    long_period: usize,
) -> Result<bool, TurtlescanError> {
    if series.len() < 3 {
        return Ok(false);
    }
    let last = series.len() - 1;
    let short = series.ma_column(short_period)?;
    let long = series.ma_column(long_period)?;
    Ok(short[last] > long[last] && short[last - 1] < long[last - 1])
}

/// The fixed breakdown window paired with each reset lookback.
pub fn reset_pairing(n_days: usize) -> Option<usize> {
    match n_days {
        20 => Some(10),
        55 => Some(20),
        _ => None,
    }
}

/// Trend-exhaustion heuristic: the most recent m-day-low breakdown happened
/// after the most recent n-day-high breakout.
///
/// Unsupported lookbacks and series shorter than max(n, m)+1 bars yield
/// `false` (skipped, not an error).
pub fn reset_signal(series: &EnrichedSeries, n_days: usize) -> bool {
    let Some(m_days) = reset_pairing(n_days) else {
        return false;
    };
    if series.len() < n_days.max(m_days) + 1 {
        return false;
    }

    let breakdown = latest_breakdown_index(series, m_days);
    let breakout = latest_breakout_index(series, n_days);
    matches!((breakdown, breakout), (Some(down), Some(up)) if down > up)
}

/// Largest i with Low[i] at or below the minimum Low of the m bars before it.
fn latest_breakdown_index(series: &EnrichedSeries, m_days: usize) -> Option<usize> {
    (m_days..series.len()).rev().find(|&i| {
        let window_min = series.bars[i - m_days..i]
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min);
        series.bars[i].low <= window_min
    })
}

/// Largest j with High[j] at or above the maximum High of the n bars before it.
fn latest_breakout_index(series: &EnrichedSeries, n_days: usize) -> Option<usize> {
    (n_days..series.len()).rev().find(|&j| {
        let window_max = series.bars[j - n_days..j]
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        series.bars[j].high >= window_max
    })
}

/// Stop level for a fresh entry at `price`: price − 2 × ATR-20.
pub fn stop_loss(price: f64, atr_20: f64) -> f64 {
    round4(price - STOP_LOSS_ATR_MULTIPLIER * atr_20)
}
