//! # Booking Ledger
//!
//! Sole writer of bookings.
//!
//! ## Lifecycle
//! ```text
//!   create ──► Confirmed ──edit──► Confirmed (fields replaced in place)
//!                  │
//!                  └──cancel──► Cancelled   (slot released, row kept)
//! ```
//!
//! ## Visibility
//! A booking is visible to its owner and to actors holding
//! `ManageAnyBooking`. Everyone else gets `NotFound`, the same answer as
//! for an id that never existed.

use std::sync::Arc;

use clipper_core::{Actor, Booking, BookingRequest, BookingStatus, Capability, Clock, CoreError};
use clipper_db::{generate_id, Database, DbError};
use tracing::{info, warn};

use crate::admission::{slot_taken, Admission};
use crate::error::{EngineError, EngineResult};

/// Creates, edits and cancels bookings.
#[derive(Clone)]
pub struct BookingLedger {
    db: Database,
    clock: Arc<dyn Clock>,
    admission: Admission,
}

impl BookingLedger {
    pub fn new(db: Database, clock: Arc<dyn Clock>, admission: Admission) -> Self {
        BookingLedger {
            db,
            clock,
            admission,
        }
    }

    /// Books `request` for `actor`.
    ///
    /// ## Errors
    /// In admission order: `InvalidInput`, `NotFound` (service, barber),
    /// `InvalidInput` (not a barber), `NotFound` (slot), `InvalidState`
    /// (rest day, past slot), `Conflict` (slot held, including a lost race).
    pub async fn create(&self, actor: &Actor, request: BookingRequest) -> EngineResult<Booking> {
        let admitted = self.admission.admit(&request, None).await?;

        let now = self.clock.now();
        let booking = Booking {
            id: generate_id(),
            user_id: actor.user_id.clone(),
            barber_id: admitted.barber.id.clone(),
            service_id: admitted.service.id.clone(),
            date: request.date,
            time_slot_id: admitted.slot.id.clone(),
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };

        self.db
            .bookings()
            .insert(&booking)
            .await
            .map_err(|err| lost_race(err, &request))?;

        info!(
            booking_id = %booking.id,
            user_id = %booking.user_id,
            barber = %admitted.barber.name,
            service = %admitted.service.name,
            date = %booking.date,
            start = %admitted.slot.start_time,
            "Booking confirmed"
        );
        Ok(booking)
    }

    /// Replaces the service, barber, date and slot of a live booking.
    ///
    /// The new triple goes through full admission, except that the booking
    /// never conflicts with itself. `created_at` is kept.
    pub async fn edit(
        &self,
        actor: &Actor,
        booking_id: &str,
        request: BookingRequest,
    ) -> EngineResult<Booking> {
        self.live_for(actor, booking_id).await?;
        let admitted = self.admission.admit(&request, Some(booking_id)).await?;

        self.db
            .bookings()
            .update_details(booking_id, &request, self.clock.now())
            .await
            .map_err(|err| lost_race(err, &request))?;

        let booking = self.fetch(booking_id).await?;
        info!(
            booking_id = %booking.id,
            barber = %admitted.barber.name,
            service = %admitted.service.name,
            date = %booking.date,
            start = %admitted.slot.start_time,
            "Booking edited"
        );
        Ok(booking)
    }

    /// Cancels a live booking, releasing its slot at once.
    pub async fn cancel(&self, actor: &Actor, booking_id: &str) -> EngineResult<()> {
        self.live_for(actor, booking_id).await?;
        self.db.bookings().cancel(booking_id, self.clock.now()).await?;

        info!(booking_id = %booking_id, "Booking cancelled");
        Ok(())
    }

    /// A booking the actor may see, whatever its status.
    pub async fn get(&self, actor: &Actor, booking_id: &str) -> EngineResult<Booking> {
        let booking = self.fetch(booking_id).await?;

        if !actor.may_act_for(&booking.user_id, Capability::ManageAnyBooking) {
            return Err(CoreError::not_found("Booking", booking_id).into());
        }

        Ok(booking)
    }

    /// The actor's live bookings, ordered by date then slot start.
    pub async fn list_for_user(&self, actor: &Actor) -> EngineResult<Vec<Booking>> {
        Ok(self.db.bookings().list_for_user(&actor.user_id, false).await?)
    }

    /// The actor's bookings including cancelled ones, same order.
    pub async fn history_for_user(&self, actor: &Actor) -> EngineResult<Vec<Booking>> {
        Ok(self.db.bookings().list_for_user(&actor.user_id, true).await?)
    }

    async fn fetch(&self, booking_id: &str) -> EngineResult<Booking> {
        let booking = self
            .db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", booking_id))?;
        Ok(booking)
    }

    /// A live booking the actor may change.
    async fn live_for(&self, actor: &Actor, booking_id: &str) -> EngineResult<Booking> {
        let booking = self.get(actor, booking_id).await?;

        if !booking.status.is_live() {
            return Err(CoreError::not_found("Booking", booking_id).into());
        }

        Ok(booking)
    }
}

/// A unique-index failure on write means another request took the triple
/// after our precheck.
fn lost_race(err: DbError, request: &BookingRequest) -> EngineError {
    if err.is_unique_violation() {
        warn!(
            barber_id = %request.barber_id,
            date = %request.date,
            time_slot_id = %request.time_slot_id,
            "Booking lost a race for its slot"
        );
        slot_taken(request).into()
    } else {
        err.into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
