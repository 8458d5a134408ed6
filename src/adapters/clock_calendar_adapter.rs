//! Session-window trading calendar.
//!
//! Thin stand-in for a real exchange calendar: the market counts as open on
//! weekdays between the configured UTC session bounds. Holidays are out of
//! scope here; the session window comes from config.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};

use crate::ports::calendar_port::CalendarPort;

pub struct ClockCalendarAdapter {
    open: NaiveTime,
    close: NaiveTime,
}

impl ClockCalendarAdapter {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }
}

impl CalendarPort for ClockCalendarAdapter {
    fn is_market_open(&self, now: NaiveDateTime) -> bool {
        let weekday = now.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            return false;
        }
        let time = now.time();
        self.open <= time && time <= self.close
    }
}
