//! # Time Slot Repository
//!
//! The administered slot catalog. Slots are immutable once created and are
//! always read in start-time order.

use chrono::NaiveTime;
use sqlx::SqlitePool;
use tracing::debug;

use super::generate_id;
use crate::error::DbResult;
use clipper_core::TimeSlot;

/// Repository for the time slot catalog.
#[derive(Debug, Clone)]
pub struct TimeSlotRepository {
    pool: SqlitePool,
}

impl TimeSlotRepository {
    /// Creates a new TimeSlotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TimeSlotRepository { pool }
    }

    /// Creates a slot. Overlap with existing slots is not checked.
    pub async fn insert(&self, start_time: NaiveTime, end_time: NaiveTime) -> DbResult<TimeSlot> {
        let slot = TimeSlot {
            id: generate_id(),
            start_time,
            end_time,
        };

        debug!(id = %slot.id, start = %start_time, end = %end_time, "Inserting time slot");

        sqlx::query("INSERT INTO time_slots (id, start_time, end_time) VALUES (?1, ?2, ?3)")
            .bind(&slot.id)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .execute(&self.pool)
            .await?;

        Ok(slot)
    }

    /// Lists the whole catalog ordered by start time.
    pub async fn list(&self) -> DbResult<Vec<TimeSlot>> {
        let slots = sqlx::query_as::<_, TimeSlot>(
            "SELECT id, start_time, end_time FROM time_slots ORDER BY start_time, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    /// Gets a slot by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TimeSlot>> {
        let slot = sqlx::query_as::<_, TimeSlot>(
            "SELECT id, start_time, end_time FROM time_slots WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(slot)
    }
}
