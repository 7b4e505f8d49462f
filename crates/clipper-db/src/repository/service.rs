//! # Service Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use clipper_core::Service;

/// Repository for the services the shop offers.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    /// Creates a new ServiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Inserts a service.
    pub async fn insert(&self, service: &Service) -> DbResult<()> {
        debug!(id = %service.id, name = %service.name, "Inserting service");

        sqlx::query(
            "INSERT INTO services (id, name, price_cents, duration_minutes) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a service by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, name, price_cents, duration_minutes FROM services WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }
}
