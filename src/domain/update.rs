//! Incremental series extension.
//!
//! Extends an already-enriched series with newly fetched bars, re-deriving
//! only the new rows. The defining correctness property: for any split k,
//! `extend(enrich(bars[..k]), bars[k..])` equals `enrich(bars)` exactly,
//! column by column.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::domain::engine::compute_row;
use crate::domain::error::TurtlescanError;
use crate::domain::indicator::atr::AtrAccumulator;
use crate::domain::ohlcv::Bar;
use crate::domain::series::EnrichedSeries;

/// Whether a series whose last bar is `last_date` already satisfies
/// "current" on `today`: last bar from today, from yesterday, or — when
/// today is a Sunday — from the preceding Friday.
pub fn is_current(last_date: NaiveDate, today: NaiveDate) -> bool {
    if last_date == today || last_date == today - Duration::days(1) {
        return true;
    }
    today.weekday() == Weekday::Sun && last_date == today - Duration::days(2)
}

/// Append the bars of `new_bars` that fall strictly after the stored
/// series' last date, deriving each new row from carried state.
///
/// `new_bars` must overlap the stored tail at exactly the anchor date (the
/// last date already present); a fetched window that does not contain the
/// anchor fails with `SynchronizationGap` and leaves the series untouched.
/// If the series is already current for `today` this is a no-op.
pub fn extend(
    existing: EnrichedSeries,
    new_bars: &[Bar],
    today: NaiveDate,
) -> Result<EnrichedSeries, TurtlescanError> {
    existing.validate()?;
    let anchor_date = existing.last_date().ok_or_else(|| {
        TurtlescanError::DataUnavailable {
            symbol: existing.symbol.clone(),
        }
    })?;

    if is_current(anchor_date, today) {
        return Ok(existing);
    }

    let anchor_pos = new_bars
        .iter()
        .position(|bar| bar.date == anchor_date)
        .ok_or_else(|| TurtlescanError::SynchronizationGap {
            symbol: existing.symbol.clone(),
            anchor: anchor_date,
        })?;

    let mut series = existing;
    let schema = series.schema.clone();
    let mut atr_state: Vec<AtrAccumulator> = Vec::with_capacity(schema.atr_periods.len());
    for &period in &schema.atr_periods {
        let column = series.atr_column(period)?;
        let last_atr = column.last().copied().unwrap_or(0.0);
        atr_state.push(AtrAccumulator::resume(period, &series.true_range, last_atr));
    }

    for bar in &new_bars[anchor_pos + 1..] {
        if bar.date <= anchor_date {
            continue; // defensive: provider re-sent an already-stored day
        }
        series.bars.push(bar.clone());
        let index = series.bars.len() - 1;
        compute_row(&mut series, &schema, &mut atr_state, index);
    }

    Ok(series)
}
