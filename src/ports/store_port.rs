//! Persisted enriched-series store port.

use crate::domain::error::TurtlescanError;
use crate::domain::series::EnrichedSeries;

/// Storage for per-instrument enriched series.
///
/// Series are partitioned strictly by symbol, so no coordination is needed
/// across instruments. `save` must be atomic (a concurrent reader of the
/// same instrument sees either the old or the new series, never a partial
/// write). `Send + Sync` so a shared handle can cross worker threads.
pub trait SeriesStorePort: Send + Sync {
    /// `Ok(None)` means the instrument has not been onboarded yet.
    fn load(&self, symbol: &str) -> Result<Option<EnrichedSeries>, TurtlescanError>;

    fn save(&self, series: &EnrichedSeries) -> Result<(), TurtlescanError>;

    /// Symbols with a stored series, sorted.
    fn list_stored(&self) -> Result<Vec<String>, TurtlescanError>;
}
