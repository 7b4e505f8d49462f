//! # Schedule Module
//!
//! The shop's working-week policy and the pure half of availability:
//! given the catalog and the slots already held, which are free?
//!
//! ## Availability Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  catalog:  [09:00-10:00] [10:00-11:00] [11:00-12:00] [12:00-13:00]     │
//! │  booked:   [09:00-10:00]                                                │
//! │                 │                                                       │
//! │                 ▼  set subtraction (catalog order kept)                 │
//! │  free:                   [10:00-11:00] [11:00-12:00] [12:00-13:00]     │
//! │                 │                                                       │
//! │                 ▼  only when the date is today: start > now (10:15)    │
//! │  result:                               [11:00-12:00] [12:00-13:00]     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The result is a snapshot. It is not coupled to a later booking; a stale
//! read loses at the store's unique index.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveTime, Weekday};

use crate::error::{CoreError, CoreResult};
use crate::types::TimeSlot;

/// Free slots per date over a window, ordered by date.
pub type AvailabilityWindow = BTreeMap<NaiveDate, Vec<TimeSlot>>;

// =============================================================================
// Working Week
// =============================================================================

/// Working-day policy: every day except one rest day per week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkWeek {
    rest_day: Weekday,
}

impl Default for WorkWeek {
    fn default() -> Self {
        WorkWeek {
            rest_day: Weekday::Sun,
        }
    }
}

impl WorkWeek {
    pub const fn new(rest_day: Weekday) -> Self {
        WorkWeek { rest_day }
    }

    pub const fn rest_day(&self) -> Weekday {
        self.rest_day
    }

    /// Checks whether the shop opens on `date`.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        date.weekday() != self.rest_day
    }

    /// Parses a rest day name such as `"sunday"` or `"Mon"`.
    pub fn parse_rest_day(name: &str) -> Option<Weekday> {
        Weekday::from_str(name.trim()).ok()
    }

    /// Working dates of the window of `days` dates starting at `start`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{NaiveDate, Weekday};
    /// use clipper_core::schedule::WorkWeek;
    ///
    /// let week = WorkWeek::new(Weekday::Sun);
    /// // Friday 2024-06-07 .. Monday 2024-06-10, Sunday skipped
    /// let start = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
    /// let dates = week.working_dates(start, 4);
    /// assert_eq!(dates.len(), 3);
    /// ```
    pub fn working_dates(&self, start: NaiveDate, days: u32) -> Vec<NaiveDate> {
        (0..u64::from(days))
            .filter_map(|offset| start.checked_add_days(Days::new(offset)))
            .filter(|date| self.is_working_day(*date))
            .collect()
    }
}

// =============================================================================
// Free Slot Computation
// =============================================================================

/// Subtracts the held slot ids from the catalog.
///
/// ## Arguments
/// * `catalog` - All slots, ordered by start time
/// * `held` - Slot ids with a live booking for this barber and date
/// * `now_if_today` - Current time, only when the date is today
///
/// ## Returns
/// The free slots, in catalog order. With `now_if_today`, only slots whose
/// start is strictly after that time survive.
pub fn free_slots(
    catalog: &[TimeSlot],
    held: &HashSet<String>,
    now_if_today: Option<NaiveTime>,
) -> Vec<TimeSlot> {
    catalog
        .iter()
        .filter(|slot| !held.contains(&slot.id))
        .filter(|slot| now_if_today.map_or(true, |now| slot.start_time > now))
        .cloned()
        .collect()
}

/// Schedule part of the admission check for a booking.
///
/// ## Rules
/// 1. `date` must be a working day (`RestDay` otherwise)
/// 2. `date` must not be before `today` (`SlotInPast`)
/// 3. On `today`, the slot must start strictly after `now` (`SlotInPast`)
pub fn check_bookable(
    week: &WorkWeek,
    date: NaiveDate,
    slot: &TimeSlot,
    today: NaiveDate,
    now: NaiveTime,
) -> CoreResult<()> {
    if !week.is_working_day(date) {
        return Err(CoreError::RestDay { date });
    }

    let started = date < today || (date == today && slot.start_time <= now);
    if started {
        return Err(CoreError::SlotInPast {
            date,
            start_time: slot.start_time,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn slot(id: &str, h: u32) -> TimeSlot {
        TimeSlot {
            id: id.to_string(),
            start_time: t(h),
            end_time: t(h + 1),
        }
    }

    fn catalog() -> Vec<TimeSlot> {
        vec![slot("s9", 9), slot("s10", 10), slot("s11", 11)]
    }

    #[test]
    fn test_booked_slot_is_excluded() {
        let held: HashSet<String> = ["s9".to_string()].into_iter().collect();
        let free = free_slots(&catalog()[..2], &held, None);
        assert_eq!(free, vec![slot("s10", 10)]);
    }

    #[test]
    fn test_today_filter_is_strict() {
        let free = free_slots(&catalog(), &HashSet::new(), Some(t(10)));
        // 10:00 has not strictly started after 10:00
        assert_eq!(free, vec![slot("s11", 11)]);
    }

    #[test]
    fn test_working_dates_skip_rest_day() {
        let week = WorkWeek::new(Weekday::Sun);
        // 2024-06-03 is a Monday; 14 days reach Sunday 06-09 and 06-16
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let dates = week.working_dates(start, 14);
        assert_eq!(dates.len(), 12);
        assert_eq!(dates.first(), Some(&start));
        assert!(dates.iter().all(|d| week.is_working_day(*d)));
    }

    #[test]
    fn test_parse_rest_day() {
        assert_eq!(WorkWeek::parse_rest_day("monday"), Some(Weekday::Mon));
        assert_eq!(WorkWeek::parse_rest_day("Sun"), Some(Weekday::Sun));
        assert_eq!(WorkWeek::parse_rest_day("someday"), None);
    }

    #[test]
    fn test_check_bookable() {
        let week = WorkWeek::default();
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();

        assert!(check_bookable(&week, monday, &slot("s11", 11), monday, t(10)).is_ok());

        let err = check_bookable(&week, sunday, &slot("s9", 9), monday, t(8)).unwrap_err();
        assert!(matches!(err, CoreError::RestDay { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = check_bookable(&week, monday, &slot("s10", 10), monday, t(10)).unwrap_err();
        assert!(matches!(err, CoreError::SlotInPast { .. }));

        let tuesday = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let err = check_bookable(&week, monday, &slot("s11", 11), tuesday, t(8)).unwrap_err();
        assert!(matches!(err, CoreError::SlotInPast { .. }));
    }
}
