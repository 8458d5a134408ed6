//! Trading-calendar port.

use chrono::NaiveDateTime;

/// Market-session check supplied by an external calendar collaborator.
/// Live scans skip their work (and log the fact) when the market is closed.
pub trait CalendarPort {
    fn is_market_open(&self, now: NaiveDateTime) -> bool;
}
