//! # Booking Repository
//!
//! Persistence for bookings and the live-slot lookups availability needs.
//!
//! ## Exclusivity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  idx_bookings_live_slot                                                 │
//! │  UNIQUE (barber_id, date, time_slot_id) WHERE status = 'confirmed'      │
//! │                                                                         │
//! │  insert / update ─► constraint holds ─► Ok                              │
//! │                  └► second live row ─► DbError::UniqueViolation         │
//! │                                                                         │
//! │  Cancelled rows are outside the index: the slot frees immediately and  │
//! │  the row stays for history and earnings.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use clipper_core::earnings::EarningRecord;
use clipper_core::{Booking, BookingRequest};

const SELECT_BOOKING: &str = r#"
    SELECT
        b.id,
        b.user_id,
        b.barber_id,
        b.service_id,
        b.date,
        b.time_slot_id,
        b.status,
        b.created_at,
        b.updated_at
    FROM bookings b
"#;

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Gets a booking by ID, whatever its status.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!("{SELECT_BOOKING} WHERE b.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Inserts a booking.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when a live booking already holds the
    /// (barber, date, slot) triple.
    pub async fn insert(&self, booking: &Booking) -> DbResult<()> {
        debug!(
            id = %booking.id,
            barber_id = %booking.barber_id,
            date = %booking.date,
            time_slot_id = %booking.time_slot_id,
            "Inserting booking"
        );

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, barber_id, service_id, date, time_slot_id,
                status, created_at, created_on, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.user_id)
        .bind(&booking.barber_id)
        .bind(&booking.service_id)
        .bind(booking.date)
        .bind(&booking.time_slot_id)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.created_at.date_naive())
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces the requested fields of a live booking in place.
    ///
    /// `created_at` and ownership are kept.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if no live booking has this id
    /// - `DbError::UniqueViolation` if the new triple is held
    pub async fn update_details(
        &self,
        id: &str,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, date = %request.date, "Updating booking");

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                service_id = ?2,
                barber_id = ?3,
                date = ?4,
                time_slot_id = ?5,
                updated_at = ?6
            WHERE id = ?1 AND status = 'confirmed'
            "#,
        )
        .bind(id)
        .bind(&request.service_id)
        .bind(&request.barber_id)
        .bind(request.date)
        .bind(&request.time_slot_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }

        Ok(())
    }

    /// Soft-cancels a live booking, releasing its slot.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no live booking has this id.
    pub async fn cancel(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, "Cancelling booking");

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND status = 'confirmed'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", id));
        }

        Ok(())
    }

    /// Slot ids held by live bookings of `barber_id` on `date`.
    pub async fn held_slot_ids(&self, barber_id: &str, date: NaiveDate) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT time_slot_id FROM bookings
            WHERE barber_id = ?1 AND date = ?2 AND status = 'confirmed'
            "#,
        )
        .bind(barber_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Id of the live booking holding a triple, ignoring `exclude_id`.
    pub async fn find_live(
        &self,
        barber_id: &str,
        date: NaiveDate,
        time_slot_id: &str,
        exclude_id: Option<&str>,
    ) -> DbResult<Option<String>> {
        let id = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id FROM bookings
            WHERE barber_id = ?1
              AND date = ?2
              AND time_slot_id = ?3
              AND status = 'confirmed'
              AND (?4 IS NULL OR id <> ?4)
            LIMIT 1
            "#,
        )
        .bind(barber_id)
        .bind(date)
        .bind(time_slot_id)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// Bookings owned by `user_id`, ordered by (date, slot start).
    ///
    /// Cancelled bookings are included only with `include_cancelled`.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        include_cancelled: bool,
    ) -> DbResult<Vec<Booking>> {
        let sql = format!(
            r#"
            {SELECT_BOOKING}
            INNER JOIN time_slots t ON t.id = b.time_slot_id
            WHERE b.user_id = ?1
              AND (?2 OR b.status = 'confirmed')
            ORDER BY b.date, t.start_time, b.created_at
            "#
        );

        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(user_id)
            .bind(include_cancelled)
            .fetch_all(&self.pool)
            .await?;

        debug!(user_id = %user_id, count = bookings.len(), "Listed bookings");
        Ok(bookings)
    }

    /// Booking earnings records created in `from..=to`.
    ///
    /// Each live booking counts once, for its service's price, on the day
    /// it was made.
    pub async fn earning_records(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<EarningRecord>> {
        let records = sqlx::query_as::<_, EarningRecord>(
            r#"
            SELECT b.created_on AS day, s.price_cents AS amount_cents
            FROM bookings b
            INNER JOIN services s ON s.id = b.service_id
            WHERE b.status = 'confirmed'
              AND b.created_on BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{fixtures, generate_id};
    use crate::Database;
    use clipper_core::{BookingStatus, Role};

    struct World {
        db: Database,
        client: String,
        barber: String,
        service: String,
        nine: String,
        ten: String,
    }

    async fn world() -> World {
        let db = fixtures::db().await;
        let client = fixtures::user(&db, "Cli", Role::Client).await.id;
        let barber = fixtures::user(&db, "Sam", Role::Worker).await.id;
        let service = fixtures::service(&db, 2000).await.id;
        let nine = fixtures::slot(&db, 9).await.id;
        let ten = fixtures::slot(&db, 10).await.id;
        World {
            db,
            client,
            barber,
            service,
            nine,
            ten,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn booking(w: &World, day: u32, slot: &str) -> Booking {
        let now = Utc::now();
        Booking {
            id: generate_id(),
            user_id: w.client.clone(),
            barber_id: w.barber.clone(),
            service_id: w.service.clone(),
            date: date(day),
            time_slot_id: slot.to_string(),
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_second_live_booking_violates_unique_index() {
        let w = world().await;
        w.db.bookings().insert(&booking(&w, 3, &w.nine)).await.unwrap();

        let err = w
            .db
            .bookings()
            .insert(&booking(&w, 3, &w.nine))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");

        // Different date or slot is fine
        w.db.bookings().insert(&booking(&w, 4, &w.nine)).await.unwrap();
        w.db.bookings().insert(&booking(&w, 3, &w.ten)).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_and_keeps_row() {
        let w = world().await;
        let first = booking(&w, 3, &w.nine);
        w.db.bookings().insert(&first).await.unwrap();

        w.db.bookings().cancel(&first.id, Utc::now()).await.unwrap();
        assert!(w.db.bookings().held_slot_ids(&w.barber, date(3)).await.unwrap().is_empty());

        let stored = w.db.bookings().get_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);

        // Slot is bookable again; a second cancel finds nothing live
        w.db.bookings().insert(&booking(&w, 3, &w.nine)).await.unwrap();
        let err = w.db.bookings().cancel(&first.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_live_excludes_self() {
        let w = world().await;
        let held = booking(&w, 3, &w.nine);
        w.db.bookings().insert(&held).await.unwrap();

        let repo = w.db.bookings();
        assert_eq!(
            repo.find_live(&w.barber, date(3), &w.nine, None).await.unwrap(),
            Some(held.id.clone())
        );
        assert_eq!(
            repo.find_live(&w.barber, date(3), &w.nine, Some(&held.id))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_update_details_moves_slot() {
        let w = world().await;
        let held = booking(&w, 3, &w.nine);
        w.db.bookings().insert(&held).await.unwrap();

        let request = BookingRequest {
            service_id: w.service.clone(),
            barber_id: w.barber.clone(),
            date: date(3),
            time_slot_id: w.ten.clone(),
        };
        w.db.bookings()
            .update_details(&held.id, &request, Utc::now())
            .await
            .unwrap();

        let held_ids = w.db.bookings().held_slot_ids(&w.barber, date(3)).await.unwrap();
        assert_eq!(held_ids, vec![w.ten.clone()]);

        let stored = w.db.bookings().get_by_id(&held.id).await.unwrap().unwrap();
        assert_eq!(stored.created_at, held.created_at);
    }

    #[tokio::test]
    async fn test_list_for_user_orders_and_filters() {
        let w = world().await;
        let late = booking(&w, 4, &w.nine);
        let ten = booking(&w, 3, &w.ten);
        let nine = booking(&w, 3, &w.nine);
        for b in [&late, &ten, &nine] {
            w.db.bookings().insert(b).await.unwrap();
        }
        w.db.bookings().cancel(&late.id, Utc::now()).await.unwrap();

        let live: Vec<_> = w
            .db
            .bookings()
            .list_for_user(&w.client, false)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(live, vec![nine.id.clone(), ten.id.clone()]);

        let all = w.db.bookings().list_for_user(&w.client, true).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].id, late.id);
    }

    #[tokio::test]
    async fn test_earning_records_skip_cancelled() {
        let w = world().await;
        let kept = booking(&w, 3, &w.nine);
        let dropped = booking(&w, 3, &w.ten);
        w.db.bookings().insert(&kept).await.unwrap();
        w.db.bookings().insert(&dropped).await.unwrap();
        w.db.bookings().cancel(&dropped.id, Utc::now()).await.unwrap();

        let today = Utc::now().date_naive();
        let records = w.db.bookings().earning_records(today, today).await.unwrap();
        assert_eq!(records, vec![EarningRecord::new(today, 2000)]);
    }
}
