//! Time sources and calendar helpers shared by the booking logic.

use std::{
    sync::Mutex,
    time::{Duration, SystemTime},
};

use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

/// Calendar date layout used on the wire and in storage (`2025-01-10`).
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Source of the current instant, injectable so hold windows can be tested.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    /// Start the clock at the given instant.
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Start the clock at midnight UTC of the given date.
    pub fn at_date(date: Date) -> Self {
        Self::new(date.midnight().assume_utc().into())
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), DATE_FORMAT)
}

/// Render a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| "invalid-date".into())
}

/// UTC calendar date of an instant.
pub fn date_of(instant: SystemTime) -> Date {
    OffsetDateTime::from(instant).date()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn dates_round_trip_through_text() {
        let parsed = parse_date("2025-01-10").unwrap();
        assert_eq!(parsed, date!(2025 - 01 - 10));
        assert_eq!(format_date(parsed), "2025-01-10");
        assert!(parse_date("10/01/2025").is_err());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at_date(date!(2025 - 01 - 09));
        let start = clock.now();
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now().duration_since(start).unwrap(), Duration::from_secs(90));
        assert_eq!(date_of(clock.now()), date!(2025 - 01 - 09));
    }
}
