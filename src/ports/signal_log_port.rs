//! Signal-log port.

use crate::domain::error::TurtlescanError;

/// Append-only sink for the signal log lines an external viewer parses.
/// Lines are fully formatted by the domain ([`crate::domain::report`]);
/// implementations only append them verbatim.
pub trait SignalLogPort {
    fn append(&self, line: &str) -> Result<(), TurtlescanError>;
}
