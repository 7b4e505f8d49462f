//! # Database Migrations
//!
//! Embedded SQL migrations for Clipper.
//!
//! ```text
//! migrations/sqlite/
//! ├── 001_initial_schema.sql  # users, services, slots, bookings, products, orders
//! └── 002_add_indexes.sql     # live-booking unique index, lookup indexes
//! ```
//!
//! Never modify an applied migration; add the next `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent; each migration runs in its own transaction, in filename order.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // The bookkeeping table is missing until the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, usize::try_from(applied).unwrap_or(0)))
}
