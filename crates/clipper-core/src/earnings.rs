//! # Earnings Module
//!
//! Pure aggregation over `(date, amount)` records read from a ledger.
//! The same arithmetic serves both domains: completed orders (order price)
//! and confirmed bookings (the booked service's price).
//!
//! ## Windows
//! ```text
//!             month_start                 week_start        today
//!                 │                          │ (Monday)       │
//!  ───────────────┼──────────────────────────┼────────────────┼──────►
//!                 │◄──────────── monthly ─────────────────────►│
//!                                            │◄─── weekly ────►│
//!                                                              │◄ daily
//! ```
//!
//! Records dated after today never count. A window with no records sums
//! to zero.

use std::collections::HashMap;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

/// One priced record: the date it counts for and its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct EarningRecord {
    pub day: NaiveDate,
    pub amount_cents: i64,
}

impl EarningRecord {
    pub const fn new(day: NaiveDate, amount_cents: i64) -> Self {
        EarningRecord { day, amount_cents }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Date bounds of the three summary windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryWindows {
    pub today: NaiveDate,
    /// Monday of the current week.
    pub week_start: NaiveDate,
    /// First day of the current month.
    pub month_start: NaiveDate,
}

impl SummaryWindows {
    pub fn for_today(today: NaiveDate) -> Self {
        let days_since_monday = u64::from(today.weekday().num_days_from_monday());
        let week_start = today
            .checked_sub_days(Days::new(days_since_monday))
            .unwrap_or(today);
        let month_start = today.with_day(1).unwrap_or(today);

        SummaryWindows {
            today,
            week_start,
            month_start,
        }
    }

    /// First date any window covers; the range to read from the store.
    pub fn earliest(&self) -> NaiveDate {
        self.week_start.min(self.month_start)
    }
}

/// Daily, weekly and monthly sums, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EarningsSummary {
    pub daily: i64,
    pub weekly: i64,
    pub monthly: i64,
}

impl EarningsSummary {
    /// Sums `records` into the windows ending at `windows.today`.
    pub fn from_records(records: &[EarningRecord], windows: &SummaryWindows) -> Self {
        let sum_from = |from: NaiveDate| -> Money {
            records
                .iter()
                .filter(|r| r.day >= from && r.day <= windows.today)
                .map(|r| Money::from_cents(r.amount_cents))
                .sum()
        };

        EarningsSummary {
            daily: sum_from(windows.today).cents(),
            weekly: sum_from(windows.week_start).cents(),
            monthly: sum_from(windows.month_start).cents(),
        }
    }
}

// =============================================================================
// Daily Series
// =============================================================================

/// Per-day totals over a month, in the `{labels, values}` chart shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EarningsSeries {
    /// `YYYY-MM-DD`, one per calendar day.
    pub labels: Vec<String>,
    /// Total in cents for the matching label.
    pub values: Vec<i64>,
}

/// First and last calendar day of `month`/`year`.
pub fn month_bounds(year: i32, month: u32) -> ValidationResult<(NaiveDate, NaiveDate)> {
    let out_of_range = || ValidationError::OutOfRange {
        field: "month".to_string(),
        min: 1,
        max: 12,
    };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(out_of_range)?;

    Ok((first, last))
}

/// Buckets `records` by day over every calendar day of the month.
///
/// Days without records contribute 0; records outside the month are
/// ignored.
pub fn daily_series(
    records: &[EarningRecord],
    year: i32,
    month: u32,
) -> ValidationResult<EarningsSeries> {
    let (first, last) = month_bounds(year, month)?;

    let mut totals: HashMap<NaiveDate, Money> = HashMap::new();
    for record in records.iter().filter(|r| r.day >= first && r.day <= last) {
        *totals.entry(record.day).or_default() += Money::from_cents(record.amount_cents);
    }

    let mut series = EarningsSeries::default();
    for day in first.iter_days().take_while(|d| *d <= last) {
        series.labels.push(day.format("%Y-%m-%d").to_string());
        series
            .values
            .push(totals.get(&day).copied().unwrap_or_default().cents());
    }

    Ok(series)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_windows() {
        // Wednesday
        let w = SummaryWindows::for_today(d(2024, 6, 5));
        assert_eq!(w.week_start, d(2024, 6, 3));
        assert_eq!(w.month_start, d(2024, 6, 1));
        assert_eq!(w.earliest(), d(2024, 6, 1));

        // Week straddling a month boundary
        let w = SummaryWindows::for_today(d(2024, 7, 2));
        assert_eq!(w.week_start, d(2024, 7, 1));
        let w = SummaryWindows::for_today(d(2024, 5, 1));
        assert_eq!(w.week_start, d(2024, 4, 29));
        assert_eq!(w.earliest(), d(2024, 4, 29));
    }

    #[test]
    fn test_summary() {
        let records = [
            EarningRecord::new(d(2024, 6, 5), 1000),
            EarningRecord::new(d(2024, 6, 5), 250),
            EarningRecord::new(d(2024, 6, 4), 500),
            EarningRecord::new(d(2024, 6, 1), 700),
            EarningRecord::new(d(2024, 5, 31), 9000),
            EarningRecord::new(d(2024, 6, 6), 9000),
        ];
        let summary = EarningsSummary::from_records(&records, &SummaryWindows::for_today(d(2024, 6, 5)));
        assert_eq!(summary.daily, 1250);
        assert_eq!(summary.weekly, 1750);
        assert_eq!(summary.monthly, 2450);
    }

    #[test]
    fn test_summary_empty_is_zero() {
        let summary = EarningsSummary::from_records(&[], &SummaryWindows::for_today(d(2024, 6, 5)));
        assert_eq!(summary, EarningsSummary::default());
    }

    #[test]
    fn test_daily_series_covers_every_day() {
        let records = [
            EarningRecord::new(d(2024, 2, 1), 100),
            EarningRecord::new(d(2024, 2, 29), 200),
            EarningRecord::new(d(2024, 2, 29), 300),
            EarningRecord::new(d(2024, 3, 1), 999),
        ];
        let series = daily_series(&records, 2024, 2).unwrap();
        assert_eq!(series.labels.len(), 29);
        assert_eq!(series.values.len(), 29);
        assert_eq!(series.labels.first().map(String::as_str), Some("2024-02-01"));
        assert_eq!(series.values.first(), Some(&100));
        assert_eq!(series.values.last(), Some(&500));
        assert_eq!(series.values.iter().sum::<i64>(), 600);
    }

    #[test]
    fn test_daily_series_rejects_bad_month() {
        assert!(daily_series(&[], 2024, 13).is_err());
        assert!(daily_series(&[], 2024, 0).is_err());
        assert_eq!(daily_series(&[], 2023, 12).unwrap().labels.len(), 31);
    }
}
