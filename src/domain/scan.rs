//! Cross-sectional scans over the instrument universe.
//!
//! Every scan is stateless: it evaluates each symbol independently against
//! its stored series (plus one live quote where the mode needs it), in
//! parallel across instruments, and restores deterministic ordering by
//! sorting results after the join. A failing instrument is reported, never
//! allowed to abort its siblings.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::warn;

use crate::domain::error::TurtlescanError;
use crate::domain::report::{self, TickerSnapshot};
use crate::domain::series::EnrichedSeries;
use crate::domain::signals::{self, ReferenceMode};
use crate::ports::data_port::MarketDataPort;
use crate::ports::store_port::SeriesStorePort;

#[derive(Debug)]
pub struct ScanFailure {
    pub symbol: String,
    pub error: TurtlescanError,
}

/// Matched symbols (sorted lexicographically) plus per-symbol failures.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub matched: Vec<String>,
    pub failures: Vec<ScanFailure>,
}

impl ScanOutcome {
    pub fn count(&self) -> usize {
        self.matched.len()
    }
}

/// Snapshot rows (sorted by symbol) plus per-symbol failures.
#[derive(Debug, Default)]
pub struct SnapshotOutcome {
    pub rows: Vec<TickerSnapshot>,
    pub failures: Vec<ScanFailure>,
}

/// Instruments whose n-day high is beaten by the reference price.
///
/// `Historical` confirms the last recorded bar against the window before
/// it; `Live` compares the quoted day-high against a window that includes
/// the last stored bar.
pub fn price_breakout_scan(
    store: &dyn SeriesStorePort,
    provider: &dyn MarketDataPort,
    symbols: &[String],
    n_days: usize,
    mode: ReferenceMode,
) -> ScanOutcome {
    scan_symbols(symbols, |symbol| {
        let series = load_series(store, symbol)?;
        match mode {
            ReferenceMode::Historical => Ok(signals::historical_breakout(&series, n_days)),
            ReferenceMode::Live => {
                let quote = provider.fetch_quote(symbol)?;
                Ok(signals::breaks_n_days_high(&series, n_days, quote.day_high))
            }
        }
    })
}

/// Instruments in bullish arrangement at their last stored index.
pub fn bullish_scan(store: &dyn SeriesStorePort, symbols: &[String]) -> ScanOutcome {
    scan_symbols(symbols, |symbol| {
        let series = load_series(store, symbol)?;
        signals::bullish_at_latest(&series)
    })
}

/// Instruments whose most recent breakdown postdates their most recent
/// breakout. Unsupported lookbacks produce an empty result, not an error.
pub fn reset_scan(
    store: &dyn SeriesStorePort,
    symbols: &[String],
    n_days: usize,
) -> ScanOutcome {
    if signals::reset_pairing(n_days).is_none() {
        return ScanOutcome::default();
    }
    scan_symbols(symbols, |symbol| {
        let series = load_series(store, symbol)?;
        Ok(signals::reset_signal(&series, n_days))
    })
}

/// Instruments whose quoted day-low undercuts their trailing n-day low —
/// the exit check for open positions.
pub fn exit_scan(
    store: &dyn SeriesStorePort,
    provider: &dyn MarketDataPort,
    symbols: &[String],
    n_days: usize,
) -> ScanOutcome {
    scan_symbols(symbols, |symbol| {
        let series = load_series(store, symbol)?;
        let quote = provider.fetch_quote(symbol)?;
        Ok(signals::breaks_n_days_low(&series, n_days, quote.day_low))
    })
}

/// Instruments whose short MA closed above the long MA after closing below
/// it the day before.
pub fn crossover_scan(
    store: &dyn SeriesStorePort,
    symbols: &[String],
    short_period: usize,
    long_period: usize,
) -> ScanOutcome {
    scan_symbols(symbols, |symbol| {
        let series = load_series(store, symbol)?;
        signals::ma_crossover(&series, short_period, long_period)
    })
}

/// One information row per symbol: last OHLC, current price, rolling-high
/// ladder, bullish flag, ATR-20 and stop level.
pub fn snapshot_scan(
    store: &dyn SeriesStorePort,
    provider: &dyn MarketDataPort,
    symbols: &[String],
    mode: ReferenceMode,
    as_of: NaiveDate,
) -> SnapshotOutcome {
    let results: Vec<(String, Result<TickerSnapshot, TurtlescanError>)> = symbols
        .par_iter()
        .map(|symbol| {
            let row = (|| {
                let series = load_series(store, symbol)?;
                let quote = match mode {
                    ReferenceMode::Live => Some(provider.fetch_quote(symbol)?),
                    ReferenceMode::Historical => None,
                };
                report::build_snapshot(&series, quote.as_ref(), as_of)
            })();
            (symbol.clone(), row)
        })
        .collect();

    let mut outcome = SnapshotOutcome::default();
    for (symbol, result) in results {
        match result {
            Ok(row) => outcome.rows.push(row),
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "snapshot failed");
                outcome.failures.push(ScanFailure { symbol, error });
            }
        }
    }
    outcome.rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    outcome.failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    outcome
}

/// Symbols that show up in more than one signal list — the confluence set
/// when several scans agree. Sorted, each symbol reported once.
pub fn symbols_in_multiple(lists: &[Vec<String>]) -> Vec<String> {
    use std::collections::BTreeMap;

    let mut hits: BTreeMap<&str, usize> = BTreeMap::new();
    for list in lists {
        // count each list once per symbol even if it repeats internally
        let unique: std::collections::BTreeSet<&str> =
            list.iter().map(String::as_str).collect();
        for symbol in unique {
            *hits.entry(symbol).or_insert(0) += 1;
        }
    }
    hits.into_iter()
        .filter(|&(_, n)| n > 1)
        .map(|(symbol, _)| symbol.to_string())
        .collect()
}

fn load_series(
    store: &dyn SeriesStorePort,
    symbol: &str,
) -> Result<EnrichedSeries, TurtlescanError> {
    let series = store
        .load(symbol)?
        .ok_or_else(|| TurtlescanError::DataUnavailable {
            symbol: symbol.to_string(),
        })?;
    series.validate()?;
    Ok(series)
}

fn scan_symbols<F>(symbols: &[String], eval: F) -> ScanOutcome
where
    F: Fn(&str) -> Result<bool, TurtlescanError> + Send + Sync,
{
    let results: Vec<(String, Result<bool, TurtlescanError>)> = symbols
        .par_iter()
        .map(|symbol| (symbol.clone(), eval(symbol)))
        .collect();

    let mut outcome = ScanOutcome::default();
    for (symbol, result) in results {
        match result {
            Ok(true) => outcome.matched.push(symbol),
            Ok(false) => {}
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "scan failed");
                outcome.failures.push(ScanFailure { symbol, error });
            }
        }
    }
    outcome.matched.sort();
    outcome.failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    outcome
}
