//! Best-effort batch refresh: fetch, enrich or extend, persist.
//!
//! Runs across the universe in parallel. Each instrument is wrapped so a
//! provider fault, a synchronization gap or malformed stored data is caught
//! at the instrument boundary, logged, and reported in the summary while
//! the rest of the batch proceeds.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::engine::enrich;
use crate::domain::error::TurtlescanError;
use crate::domain::ohlcv::Bar;
use crate::domain::scan::ScanFailure;
use crate::domain::schema::IndicatorSchema;
use crate::domain::update::{extend, is_current};
use crate::ports::data_port::MarketDataPort;
use crate::ports::store_port::SeriesStorePort;

/// What happened to one instrument during a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// First onboarding: full history fetched and enriched.
    Created,
    /// Existing series extended with at least one new bar.
    Extended,
    /// Already current (or the provider had nothing new); store untouched.
    Current,
}

#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub created: Vec<String>,
    pub extended: Vec<String>,
    pub current: Vec<String>,
    pub failures: Vec<ScanFailure>,
}

impl RefreshSummary {
    pub fn processed(&self) -> usize {
        self.created.len() + self.extended.len() + self.current.len()
    }
}

/// Refresh every symbol, best-effort, parallel across instruments.
/// Result lists come back sorted for deterministic output.
pub fn refresh_universe(
    provider: &dyn MarketDataPort,
    store: &dyn SeriesStorePort,
    symbols: &[String],
    schema: &IndicatorSchema,
    today: NaiveDate,
) -> RefreshSummary {
    let results: Vec<(String, Result<RefreshStatus, TurtlescanError>)> = symbols
        .par_iter()
        .map(|symbol| {
            let status = refresh_symbol(provider, store, symbol, schema, today);
            (symbol.clone(), status)
        })
        .collect();

    let mut summary = RefreshSummary::default();
    for (symbol, result) in results {
        match result {
            Ok(RefreshStatus::Created) => summary.created.push(symbol),
            Ok(RefreshStatus::Extended) => summary.extended.push(symbol),
            Ok(RefreshStatus::Current) => summary.current.push(symbol),
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "refresh failed");
                summary.failures.push(ScanFailure { symbol, error });
            }
        }
    }
    summary.created.sort();
    summary.extended.sort();
    summary.current.sort();
    summary.failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    info!(
        created = summary.created.len(),
        extended = summary.extended.len(),
        current = summary.current.len(),
        failed = summary.failures.len(),
        "refresh finished"
    );
    summary
}

/// Fetch and persist one instrument. The stored series is only replaced
/// once the new one is fully computed, and the store's save is atomic, so
/// a concurrent reader never sees a partial series.
pub fn refresh_symbol(
    provider: &dyn MarketDataPort,
    store: &dyn SeriesStorePort,
    symbol: &str,
    schema: &IndicatorSchema,
    today: NaiveDate,
) -> Result<RefreshStatus, TurtlescanError> {
    match store.load(symbol)? {
        None => {
            let bars = fetch_completed_bars(provider, symbol, today)?;
            let series = enrich(symbol, &bars, schema)?;
            store.save(&series)?;
            Ok(RefreshStatus::Created)
        }
        Some(series) => {
            if let Some(last) = series.last_date() {
                if is_current(last, today) {
                    return Ok(RefreshStatus::Current);
                }
            }
            let bars = fetch_completed_bars(provider, symbol, today)?;
            let rows_before = series.len();
            let extended = extend(series, &bars, today)?;
            if extended.len() == rows_before {
                return Ok(RefreshStatus::Current);
            }
            store.save(&extended)?;
            Ok(RefreshStatus::Extended)
        }
    }
}

/// Full history minus the provider's in-progress bar: a final row carrying
/// today's date is dropped because the trading day is not complete.
fn fetch_completed_bars(
    provider: &dyn MarketDataPort,
    symbol: &str,
    today: NaiveDate,
) -> Result<Vec<Bar>, TurtlescanError> {
    let mut bars = provider.fetch_history(symbol)?;
    if bars.last().is_some_and(|bar| bar.date == today) {
        bars.pop();
    }
    if bars.is_empty() {
        return Err(TurtlescanError::DataUnavailable {
            symbol: symbol.to_string(),
        });
    }
    Ok(bars)
}
