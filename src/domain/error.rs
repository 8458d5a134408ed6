//! Domain error taxonomy.
//!
//! Per-instrument failures (`DataUnavailable`, `Provider`,
//! `SynchronizationGap`, `Computation`) are caught at the instrument
//! boundary by the scans and the refresh pipeline; only `Universe` aborts a
//! whole run.

use chrono::NaiveDate;

/// Top-level error type for turtlescan.
#[derive(Debug, thiserror::Error)]
pub enum TurtlescanError {
    #[error("no market data for {symbol}")]
    DataUnavailable { symbol: String },

    #[error("provider error for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    #[error("no overlap with stored history for {symbol}: last stored date {anchor} not in fetched bars")]
    SynchronizationGap { symbol: String, anchor: NaiveDate },

    #[error("malformed series for {symbol}: {reason}")]
    Computation { symbol: String, reason: String },

    #[error("universe error: {reason}")]
    Universe { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TurtlescanError> for std::process::ExitCode {
    fn from(err: &TurtlescanError) -> Self {
        let code: u8 = match err {
            TurtlescanError::Io(_) => 1,
            TurtlescanError::ConfigParse { .. }
            | TurtlescanError::ConfigMissing { .. }
            | TurtlescanError::ConfigInvalid { .. } => 2,
            TurtlescanError::Universe { .. } => 3,
            TurtlescanError::Provider { .. } => 4,
            TurtlescanError::SynchronizationGap { .. } => 5,
            TurtlescanError::DataUnavailable { .. }
            | TurtlescanError::Computation { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
