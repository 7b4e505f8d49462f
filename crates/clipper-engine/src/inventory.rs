//! # Inventory Ledger
//!
//! Sole mutator of product stock.
//!
//! ## Stock Movements
//! ```text
//! reserve   stock -= q   only if stock >= q, one conditional statement
//! release   stock += q   restitution of an earlier reservation
//! restock   stock += q   administrative, requires ManageInventory
//! ```
//!
//! `reserve_on` and `release_on` join a caller's transaction, so a multi-line
//! order reserves all of its lines or none.

use std::sync::Arc;

use clipper_core::validation::{validate_id, validate_quantity};
use clipper_core::{Actor, Capability, Clock, CoreError, OrderLine, ValidationError};
use clipper_db::{Database, ProductRepository, Reservation, Restitution};
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::EngineResult;

/// Reserves and restores product stock.
#[derive(Clone)]
pub struct InventoryLedger {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl InventoryLedger {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        InventoryLedger { db, clock }
    }

    /// Reserves `quantity` units of a product in its own statement.
    ///
    /// ## Errors
    /// - `InvalidInput` for a malformed id or non-positive quantity
    /// - `NotFound` if the product doesn't exist
    /// - `InsufficientStock` if fewer units are available; nothing changes
    pub async fn reserve(&self, product_id: &str, quantity: i64) -> EngineResult<OrderLine> {
        let mut conn = self.db.acquire().await?;
        self.reserve_on(&mut conn, product_id, quantity).await
    }

    /// Like [`reserve`](Self::reserve), on the caller's connection.
    ///
    /// Returns the order line with the product's name and price frozen.
    pub async fn reserve_on(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<OrderLine> {
        validate_id("product_id", product_id)?;
        validate_quantity(quantity, i64::MAX)?;

        let outcome =
            ProductRepository::reserve_on(conn, product_id, quantity, self.clock.now()).await?;

        match outcome {
            Reservation::Reserved {
                name,
                unit_price_cents,
            } => Ok(OrderLine {
                product_id: product_id.to_string(),
                name_snapshot: name,
                unit_price_cents,
                quantity,
            }),
            Reservation::Insufficient { available } => Err(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available,
                requested: quantity,
            }
            .into()),
            Reservation::Missing => Err(CoreError::not_found("Product", product_id).into()),
        }
    }

    /// Returns `quantity` units to stock. Returns the new stock.
    ///
    /// ## Errors
    /// - `InvalidInput` for a non-positive quantity, or one that would push
    ///   stock past `i64::MAX`; nothing changes
    /// - `NotFound` if the product doesn't exist
    pub async fn release(&self, product_id: &str, quantity: i64) -> EngineResult<i64> {
        let mut conn = self.db.acquire().await?;
        self.release_on(&mut conn, product_id, quantity).await
    }

    /// Like [`release`](Self::release), on the caller's connection.
    pub async fn release_on(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<i64> {
        validate_quantity(quantity, i64::MAX)?;

        match ProductRepository::release_on(conn, product_id, quantity, self.clock.now()).await? {
            Restitution::Released { stock } => Ok(stock),
            Restitution::WouldOverflow { stock } => Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: i64::MAX - stock,
            }
            .into()),
            Restitution::Missing => Err(CoreError::not_found("Product", product_id).into()),
        }
    }

    /// Adds delivered units to a product's stock. Returns the new stock.
    pub async fn restock(
        &self,
        actor: &Actor,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<i64> {
        actor.require(Capability::ManageInventory)?;
        validate_id("product_id", product_id)?;

        let stock = self.release(product_id, quantity).await?;

        info!(product_id = %product_id, quantity, stock, "Product restocked");
        Ok(stock)
    }

    /// Current stock of a product.
    pub async fn stock(&self, product_id: &str) -> EngineResult<i64> {
        let stock = self
            .db
            .products()
            .stock(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;
        Ok(stock)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
