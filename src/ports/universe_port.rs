//! Instrument universe port.

use crate::domain::error::TurtlescanError;

/// The tracked universe of instruments. Failure here is the only error
/// fatal to a run.
pub trait UniversePort {
    /// Sorted, de-duplicated symbol list.
    fn list_instruments(&self) -> Result<Vec<String>, TurtlescanError>;
}
