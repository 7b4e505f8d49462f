//! Injectable time source.
//!
//! "Today" and "now" decide the same-day slot filter, admission of past
//! dates and every earnings window, so the engine never calls `Utc::now()`
//! directly; it asks a [`Clock`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Current wall-clock time of day.
    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for deterministic tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time.
    pub const fn new(time: DateTime<Utc>) -> Self {
        FixedClock { time }
    }

    /// Fixed clock at `date` `hour:minute` UTC.
    ///
    /// Returns `None` for an invalid hour or minute.
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Option<Self> {
        let time = date.and_hms_opt(hour, minute, 0)?.and_utc();
        Some(FixedClock::new(time))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let clock = FixedClock::at(date, 10, 30).unwrap();
        assert_eq!(clock.today(), date);
        assert_eq!(clock.time_of_day(), NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert!(FixedClock::at(date, 25, 0).is_none());
    }
}
