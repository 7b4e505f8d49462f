//! # Booking Admission
//!
//! The ordered checks a booking request passes before it may be written.
//!
//! ## Pipeline
//! ```text
//! request
//!   │
//!   ├─ 1. fields well-formed ............ InvalidInput
//!   ├─ 2. service exists ................ NotFound
//!   ├─ 3. barber exists ................. NotFound
//!   ├─ 4. barber can cut ................ InvalidInput (NotABarber)
//!   ├─ 5. slot exists ................... NotFound
//!   ├─ 6. working day, not in the past .. InvalidState
//!   └─ 7. triple has no live booking .... Conflict
//!   ▼
//! Admitted
//! ```
//!
//! The first failing step decides the error. Step 7 is a precheck only: two
//! requests can both pass it, and the store's unique index picks the winner
//! when they write.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDateTime};
use clipper_core::schedule::{check_bookable, WorkWeek};
use clipper_core::validation::{validate_booking_request, validate_id};
use clipper_core::{
    BookingRequest, Capability, Clock, CoreError, Service, TimeSlot, User,
};
use clipper_db::Database;
use tracing::warn;

use crate::error::EngineResult;

/// The entities a request resolved to, once every check passed.
#[derive(Debug, Clone)]
pub struct Admitted {
    pub service: Service,
    pub barber: User,
    pub slot: TimeSlot,
}

/// Runs the admission checks against the store.
#[derive(Clone)]
pub struct Admission {
    db: Database,
    clock: Arc<dyn Clock>,
    week: WorkWeek,
    offset: FixedOffset,
}

impl Admission {
    /// `offset` places the clock's instant on the shop's wall clock.
    pub fn new(db: Database, clock: Arc<dyn Clock>, week: WorkWeek, offset: FixedOffset) -> Self {
        Admission {
            db,
            clock,
            week,
            offset,
        }
    }

    /// The current date and time on the shop's wall clock.
    pub fn local_now(&self) -> NaiveDateTime {
        self.clock.now().with_timezone(&self.offset).naive_local()
    }

    /// Admits `request`, ignoring the booking `exclude_id` when looking for
    /// a conflicting live booking (an edit may keep its own triple).
    pub async fn admit(
        &self,
        request: &BookingRequest,
        exclude_id: Option<&str>,
    ) -> EngineResult<Admitted> {
        let result = self.run(request, exclude_id).await;

        if let Err(err) = &result {
            warn!(
                barber_id = %request.barber_id,
                date = %request.date,
                time_slot_id = %request.time_slot_id,
                error = %err,
                "Booking admission rejected"
            );
        }

        result
    }

    async fn run(
        &self,
        request: &BookingRequest,
        exclude_id: Option<&str>,
    ) -> EngineResult<Admitted> {
        validate_booking_request(request)?;
        let service = self.service(&request.service_id).await?;
        let barber = self.barber(&request.barber_id).await?;
        let slot = self.slot(&request.time_slot_id).await?;
        self.schedule(request, &slot)?;
        self.exclusivity(request, exclude_id).await?;

        Ok(Admitted {
            service,
            barber,
            slot,
        })
    }

    /// Resolves a user id to a user able to take bookings.
    pub async fn barber(&self, barber_id: &str) -> EngineResult<User> {
        validate_id("barber_id", barber_id)?;

        let user = self
            .db
            .users()
            .get_by_id(barber_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Barber", barber_id))?;

        if !user.role.has(Capability::Cut) {
            return Err(CoreError::NotABarber {
                user_id: user.id,
            }
            .into());
        }

        Ok(user)
    }

    async fn service(&self, service_id: &str) -> EngineResult<Service> {
        let service = self
            .db
            .services()
            .get_by_id(service_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Service", service_id))?;
        Ok(service)
    }

    async fn slot(&self, time_slot_id: &str) -> EngineResult<TimeSlot> {
        let slot = self
            .db
            .time_slots()
            .get_by_id(time_slot_id)
            .await?
            .ok_or_else(|| CoreError::not_found("TimeSlot", time_slot_id))?;
        Ok(slot)
    }

    fn schedule(&self, request: &BookingRequest, slot: &TimeSlot) -> EngineResult<()> {
        let now = self.local_now();
        check_bookable(&self.week, request.date, slot, now.date(), now.time())?;
        Ok(())
    }

    async fn exclusivity(
        &self,
        request: &BookingRequest,
        exclude_id: Option<&str>,
    ) -> EngineResult<()> {
        let held = self
            .db
            .bookings()
            .find_live(
                &request.barber_id,
                request.date,
                &request.time_slot_id,
                exclude_id,
            )
            .await?;

        match held {
            Some(_) => Err(slot_taken(request).into()),
            None => Ok(()),
        }
    }
}

/// The conflict error for a request's triple.
pub fn slot_taken(request: &BookingRequest) -> CoreError {
    CoreError::SlotTaken {
        barber_id: request.barber_id.clone(),
        date: request.date,
        time_slot_id: request.time_slot_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{shop, Shop};
    use chrono::{Days, NaiveDate};
    use clipper_core::ErrorKind;

    use crate::Engine;

    fn request(shop: &Shop, date: NaiveDate, slot: usize) -> BookingRequest {
        BookingRequest {
            service_id: shop.service.id.clone(),
            barber_id: shop.barber.id.clone(),
            date,
            time_slot_id: shop.slots[slot].id.clone(),
        }
    }

    fn admission(shop: &Shop) -> Admission {
        Admission::new(
            shop.db.clone(),
            shop.clock.clone(),
            shop.engine.config().work_week(),
            shop.engine.config().utc_offset,
        )
    }

    #[tokio::test]
    async fn test_admits_valid_request() {
        let shop = shop().await;
        let tomorrow = shop.today().checked_add_days(Days::new(1)).unwrap();

        let admitted = admission(&shop).admit(&request(&shop, tomorrow, 0), None).await.unwrap();
        assert_eq!(admitted.barber.id, shop.barber.id);
        assert_eq!(admitted.slot.id, shop.slots[0].id);
    }

    #[tokio::test]
    async fn test_first_failing_check_wins() {
        let shop = shop().await;
        let tomorrow = shop.today().checked_add_days(Days::new(1)).unwrap();

        // Missing service and non-barber: service is checked first
        let mut req = request(&shop, tomorrow, 0);
        req.service_id = "550e8400-e29b-41d4-a716-446655440000".to_string();
        req.barber_id = shop.client.id.clone();
        let err = admission(&shop).admit(&req, None).await.unwrap_err();
        assert!(matches!(err, crate::EngineError::Core(CoreError::NotFound { ref entity, .. }) if entity == "Service"));

        // Client as barber
        let mut req = request(&shop, tomorrow, 0);
        req.barber_id = shop.client.id.clone();
        let err = admission(&shop).admit(&req, None).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidInput));

        // Malformed slot id
        let mut req = request(&shop, tomorrow, 0);
        req.time_slot_id = "slot-nine".to_string();
        let err = admission(&shop).admit(&req, None).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidInput));
    }

    #[tokio::test]
    async fn test_rejects_rest_day_and_past() {
        let shop = shop().await;

        // 2024-06-09 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        let err = admission(&shop).admit(&request(&shop, sunday, 0), None).await.unwrap_err();
        assert!(matches!(err, crate::EngineError::Core(CoreError::RestDay { .. })));

        // Today at 10:30: the 09:00 and 10:00 slots have started
        let err = admission(&shop)
            .admit(&request(&shop, shop.today(), 1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::EngineError::Core(CoreError::SlotInPast { .. })));

        assert!(admission(&shop)
            .admit(&request(&shop, shop.today(), 2), None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_past_check_uses_shop_wall_clock() {
        let shop = shop().await;
        // 10:30 UTC is 12:30 two hours east
        let config = shop
            .engine
            .config()
            .clone()
            .utc_offset(FixedOffset::east_opt(2 * 3600).unwrap());
        let engine = Engine::with_clock(shop.db.clone(), config, shop.clock.clone());
        let east = Admission::new(
            shop.db.clone(),
            shop.clock.clone(),
            engine.config().work_week(),
            engine.config().utc_offset,
        );

        let err = east
            .admit(&request(&shop, shop.today(), 2), None)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::EngineError::Core(CoreError::SlotInPast { .. })));

        let err = engine
            .bookings()
            .create(&shop.client_actor(), request(&shop, shop.today(), 2))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidState));

        // One hour west it is 09:30, so the 10:00 slot is still ahead
        let west = Admission::new(
            shop.db.clone(),
            shop.clock.clone(),
            engine.config().work_week(),
            FixedOffset::west_opt(3600).unwrap(),
        );
        assert!(west.admit(&request(&shop, shop.today(), 1), None).await.is_ok());
    }
}
