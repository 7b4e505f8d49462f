//! # Availability Resolver
//!
//! Which of a barber's slots are still free on a date, or over a window of
//! dates.
//!
//! Results are snapshots of committed state. Nothing reserves a slot until
//! a booking is written; a stale read loses at the store's unique index.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use clipper_core::schedule::{free_slots, AvailabilityWindow, WorkWeek};
use clipper_core::{Clock, TimeSlot};
use clipper_db::Database;
use tracing::debug;

use crate::admission::Admission;
use crate::error::EngineResult;

/// Computes free slots from the catalog and the live bookings.
#[derive(Clone)]
pub struct AvailabilityResolver {
    db: Database,
    week: WorkWeek,
    window_days: u32,
    admission: Admission,
}

impl AvailabilityResolver {
    pub fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        week: WorkWeek,
        window_days: u32,
        offset: FixedOffset,
    ) -> Self {
        let admission = Admission::new(db.clone(), clock, week, offset);
        AvailabilityResolver {
            db,
            week,
            window_days,
            admission,
        }
    }

    /// Free slots of `barber_id` on `date`, in catalog order.
    ///
    /// With `now_if_today`, only slots starting strictly after it are kept.
    /// Pass it only when `date` is the current date.
    pub async fn available_slots(
        &self,
        barber_id: &str,
        date: NaiveDate,
        now_if_today: Option<NaiveTime>,
    ) -> EngineResult<Vec<TimeSlot>> {
        let catalog = self.db.time_slots().list().await?;
        self.free_on(&catalog, barber_id, date, now_if_today).await
    }

    /// Free slots per working date over `days` dates starting at `start`.
    ///
    /// Rest days and dates before today are absent from the result; working
    /// dates with nothing free map to an empty list. The same-day time
    /// filter applies only to the current date.
    pub async fn available_window(
        &self,
        barber_id: &str,
        start: NaiveDate,
        days: u32,
    ) -> EngineResult<AvailabilityWindow> {
        let barber = self.admission.barber(barber_id).await?;
        let catalog = self.db.time_slots().list().await?;

        let now = self.admission.local_now();
        let today = now.date();

        let mut window = AvailabilityWindow::new();
        for date in self.week.working_dates(start, days) {
            if date < today {
                continue;
            }
            let now_if_today = (date == today).then(|| now.time());
            let free = self.free_on(&catalog, &barber.id, date, now_if_today).await?;
            window.insert(date, free);
        }

        debug!(
            barber_id = %barber.id,
            start = %start,
            days,
            dates = window.len(),
            "Resolved availability window"
        );
        Ok(window)
    }

    /// The default client-facing window: the configured number of days
    /// starting today.
    pub async fn upcoming(&self, barber_id: &str) -> EngineResult<AvailabilityWindow> {
        let today = self.admission.local_now().date();
        self.available_window(barber_id, today, self.window_days)
            .await
    }

    async fn free_on(
        &self,
        catalog: &[TimeSlot],
        barber_id: &str,
        date: NaiveDate,
        now_if_today: Option<NaiveTime>,
    ) -> EngineResult<Vec<TimeSlot>> {
        let held: HashSet<String> = self
            .db
            .bookings()
            .held_slot_ids(barber_id, date)
            .await?
            .into_iter()
            .collect();

        Ok(free_slots(catalog, &held, now_if_today))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, FixedOffset, NaiveDate, NaiveTime};
    use clipper_core::{CoreError, ErrorKind};

    use crate::testing::shop;
    use crate::{Engine, EngineError};

    #[tokio::test]
    async fn test_booked_slot_is_excluded() {
        let shop = shop().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let resolver = shop.engine.availability();

        let before = resolver.available_slots(&shop.barber.id, date, None).await.unwrap();
        assert_eq!(before, shop.slots);

        shop.book(&shop.client_actor(), date, 0).await.unwrap();

        let after = resolver.available_slots(&shop.barber.id, date, None).await.unwrap();
        assert_eq!(after, shop.slots[1..].to_vec());
    }

    #[tokio::test]
    async fn test_other_barber_is_unaffected() {
        let shop = shop().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        shop.book(&shop.client_actor(), date, 0).await.unwrap();

        let free = shop
            .engine
            .availability()
            .available_slots(&shop.second_barber.id, date, None)
            .await
            .unwrap();
        assert_eq!(free.len(), shop.slots.len());
    }

    #[tokio::test]
    async fn test_today_filter() {
        let shop = shop().await;
        let free = shop
            .engine
            .availability()
            .available_slots(
                &shop.barber.id,
                shop.today(),
                Some(NaiveTime::from_hms_opt(10, 30, 0).unwrap()),
            )
            .await
            .unwrap();
        let starts: Vec<_> = free.iter().map(|s| s.start_time.format("%H:%M").to_string()).collect();
        assert_eq!(starts, vec!["11:00", "12:00"]);
    }

    #[tokio::test]
    async fn test_window_skips_rest_day_and_filters_today_only() {
        let shop = shop().await;
        // Monday 2024-06-03 10:30, seven days reach Sunday 06-09
        let window = shop
            .engine
            .availability()
            .available_window(&shop.barber.id, shop.today(), 7)
            .await
            .unwrap();

        assert_eq!(window.len(), 6);
        assert!(!window.contains_key(&NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()));
        assert_eq!(window[&shop.today()].len(), 2);

        let tomorrow = shop.today().checked_add_days(Days::new(1)).unwrap();
        assert_eq!(window[&tomorrow].len(), shop.slots.len());
    }

    #[tokio::test]
    async fn test_window_omits_past_dates() {
        let shop = shop().await;
        // Saturday 06-01 through Tuesday 06-04; Sunday 06-02 is the rest day
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let window = shop
            .engine
            .availability()
            .available_window(&shop.barber.id, saturday, 4)
            .await
            .unwrap();

        let dates: Vec<_> = window.keys().copied().collect();
        let tuesday = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        assert_eq!(dates, vec![shop.today(), tuesday]);

        // A window entirely in the past is empty
        let window = shop
            .engine
            .availability()
            .available_window(&shop.barber.id, saturday, 1)
            .await
            .unwrap();
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn test_window_follows_shop_offset() {
        let shop = shop().await;
        let tuesday = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();

        // 10:30 UTC is 12:30 two hours east: nothing left today
        let config = shop
            .engine
            .config()
            .clone()
            .utc_offset(FixedOffset::east_opt(2 * 3600).unwrap());
        let east = Engine::with_clock(shop.db.clone(), config, shop.clock.clone());
        let window = east.availability().available_window(&shop.barber.id, shop.today(), 2).await.unwrap();
        assert_eq!(window.get(&shop.today()), Some(&Vec::new()));
        assert_eq!(window[&tuesday].len(), shop.slots.len());

        // Eleven hours west it is still Sunday 06-02 at 23:30
        let config = shop
            .engine
            .config()
            .clone()
            .utc_offset(FixedOffset::west_opt(11 * 3600).unwrap());
        let west = Engine::with_clock(shop.db.clone(), config, shop.clock.clone());
        let window = west.availability().upcoming(&shop.barber.id).await.unwrap();
        assert_eq!(window.keys().next(), Some(&shop.today()));
        assert_eq!(window[&shop.today()].len(), shop.slots.len());
    }

    #[tokio::test]
    async fn test_fully_booked_day_is_empty_not_missing() {
        let shop = shop().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        for slot in 0..shop.slots.len() {
            shop.book(&shop.client_actor(), date, slot).await.unwrap();
        }

        let window = shop
            .engine
            .availability()
            .available_window(&shop.barber.id, date, 1)
            .await
            .unwrap();
        assert_eq!(window.get(&date), Some(&Vec::new()));
    }

    #[tokio::test]
    async fn test_upcoming_uses_configured_window() {
        let shop = shop().await;
        let window = shop.engine.availability().upcoming(&shop.barber.id).await.unwrap();

        // 14 days from Monday 06-03 include Sundays 06-09 and 06-16
        assert_eq!(window.len(), 12);
        assert_eq!(window.keys().next(), Some(&shop.today()));
    }

    #[tokio::test]
    async fn test_window_validates_barber() {
        let shop = shop().await;
        let availability = shop.engine.availability();

        let err = availability.upcoming("").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidInput));

        let err = availability
            .upcoming("550e8400-e29b-41d4-a716-446655440000")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::NotFound { .. })));

        let err = availability.upcoming(&shop.client.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::NotABarber { .. })));
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_again() {
        let shop = shop().await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let actor = shop.client_actor();
        let booking = shop.book(&actor, date, 0).await.unwrap();

        shop.engine.bookings().cancel(&actor, &booking.id).await.unwrap();

        let free = shop
            .engine
            .availability()
            .available_slots(&shop.barber.id, date, None)
            .await
            .unwrap();
        assert_eq!(free.len(), shop.slots.len());
    }
}
