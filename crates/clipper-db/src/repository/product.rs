//! # Product Repository
//!
//! Products and the only statements that move stock.
//!
//! ## Conditional Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                        │
//! │     SET stock = stock - :qty                                            │
//! │   WHERE id = :id AND stock >= :qty                                      │
//! │  RETURNING name, price_cents                                            │
//! │                                                                         │
//! │  row returned  ─► Reserved (check and decrement were one statement)    │
//! │  no row        ─► SELECT stock ─► Insufficient { available } | Missing │
//! │                                                                         │
//! │  Two writers serialize on the database lock, so N concurrent           │
//! │  reservations against stock S succeed at most floor(S / qty) times.    │
//! │  CHECK (stock >= 0) backs this at the schema level.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Releases follow the same shape with `stock + :qty`, conditional on the
//! sum staying within `i64`.
//!
//! The `_on` functions run on a caller-supplied connection so the order
//! lifecycle can reserve several products inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use clipper_core::Product;

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    /// Stock was decremented. Carries the product data to freeze on the line.
    Reserved { name: String, unit_price_cents: i64 },
    /// The product exists but holds fewer than the requested units.
    Insufficient { available: i64 },
    /// No such product.
    Missing,
}

/// Outcome of a stock increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restitution {
    /// Stock was incremented; carries the new stock.
    Released { stock: i64 },
    /// Adding the units would overflow the stock counter. Nothing changed.
    WouldOverflow { stock: i64 },
    /// No such product.
    Missing,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, stock = product.stock, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Current stock of a product, `None` if it doesn't exist.
    pub async fn stock(&self, id: &str) -> DbResult<Option<i64>> {
        let mut conn = self.pool.acquire().await?;
        Self::stock_on(&mut conn, id).await
    }

    /// Reserves `quantity` units on a pooled connection (autocommit).
    pub async fn reserve(
        &self,
        id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Reservation> {
        let mut conn = self.pool.acquire().await?;
        Self::reserve_on(&mut conn, id, quantity, now).await
    }

    /// Returns `quantity` units to stock on a pooled connection.
    pub async fn release(
        &self,
        id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Restitution> {
        let mut conn = self.pool.acquire().await?;
        Self::release_on(&mut conn, id, quantity, now).await
    }

    // =========================================================================
    // Connection-scoped operations
    // =========================================================================

    /// Current stock, read on `conn`.
    pub async fn stock_on(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(stock)
    }

    /// Atomically decrements stock by `quantity` if enough is available.
    ///
    /// Never leaves stock negative. On failure nothing is written.
    pub async fn reserve_on(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Reservation> {
        let reserved = sqlx::query_as::<_, (String, i64)>(
            r#"
            UPDATE products SET
                stock = stock - ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            RETURNING name, price_cents
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some((name, unit_price_cents)) = reserved {
            debug!(product_id = %id, quantity, "Stock reserved");
            return Ok(Reservation::Reserved {
                name,
                unit_price_cents,
            });
        }

        let outcome = match Self::stock_on(conn, id).await? {
            Some(available) => Reservation::Insufficient { available },
            None => Reservation::Missing,
        };
        debug!(product_id = %id, quantity, ?outcome, "Stock reservation refused");
        Ok(outcome)
    }

    /// Increments stock by `quantity` unless the sum would exceed `i64::MAX`.
    ///
    /// SQLite turns an overflowing integer sum into a REAL, so the bound is
    /// part of the statement's condition.
    pub async fn release_on(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Restitution> {
        let released = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE products SET
                stock = stock + ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock <= 9223372036854775807 - ?2
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(stock) = released {
            debug!(product_id = %id, quantity, stock, "Stock released");
            return Ok(Restitution::Released { stock });
        }

        let outcome = match Self::stock_on(conn, id).await? {
            Some(stock) => Restitution::WouldOverflow { stock },
            None => Restitution::Missing,
        };
        debug!(product_id = %id, quantity, ?outcome, "Stock release refused");
        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
