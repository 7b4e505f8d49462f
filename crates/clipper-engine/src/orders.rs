//! # Order Lifecycle Manager
//!
//! Creates orders against reserved stock and drives them to a terminal
//! state.
//!
//! ## Flow
//! ```text
//! create ──► BEGIN
//!              reserve line 1 ─┐
//!              reserve line 2  ├── any failure: ROLLBACK, no stock moves
//!              ...            ─┘
//!              INSERT order + lines (Pending, price = Σ line totals)
//!            COMMIT
//!
//! pay    ──► Pending ──(valid card)──► Completed     stock untouched
//! cancel ──► Pending ─────────────────► Cancelled    stock released from
//!                                                    the persisted lines
//! ```
//!
//! The status change is conditional on `pending`, so of two racing
//! transitions exactly one wins and a cancelled order restores its stock
//! exactly once.

use std::sync::Arc;

use clipper_core::earnings::EarningsSummary;
use clipper_core::payment::PaymentInstrument;
use clipper_core::validation::{validate_id, validate_line_items};
use clipper_core::{
    Actor, Capability, Clock, CoreError, LineItemRequest, Order, OrderLine, OrderStatus,
};
use clipper_db::{generate_id, Database, DbError, OrderRepository};
use tracing::{info, warn};

use crate::earnings::{EarningsAggregator, EarningsSource};
use crate::error::EngineResult;
use crate::inventory::InventoryLedger;

/// Owns the Pending → Completed | Cancelled state machine.
#[derive(Clone)]
pub struct OrderLifecycle {
    db: Database,
    clock: Arc<dyn Clock>,
    inventory: InventoryLedger,
    earnings: EarningsAggregator,
    max_item_quantity: i64,
}

impl OrderLifecycle {
    pub fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        inventory: InventoryLedger,
        earnings: EarningsAggregator,
        max_item_quantity: i64,
    ) -> Self {
        OrderLifecycle {
            db,
            clock,
            inventory,
            earnings,
            max_item_quantity,
        }
    }

    /// Places a Pending order for `actor`, reserving stock for every line.
    ///
    /// ## Errors
    /// - `InvalidInput` for no lines, a malformed id or a bad quantity
    /// - `NotFound` for an unknown product
    /// - `InsufficientStock` for the first line that can't be covered
    /// - `InvalidInput` if the total doesn't fit in `i64` cents
    ///
    /// On any error no stock moves and no order exists.
    pub async fn create(&self, actor: &Actor, items: &[LineItemRequest]) -> EngineResult<Order> {
        validate_line_items(items, self.max_item_quantity)?;

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            // An early return drops `tx`, rolling back earlier reservations.
            let line = self
                .inventory
                .reserve_on(&mut tx, &item.product_id, item.quantity)
                .await
                .inspect_err(|err| {
                    warn!(
                        user_id = %actor.user_id,
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        error = %err,
                        "Order rejected"
                    );
                })?;
            lines.push(line);
        }

        let mut order = Order {
            id: generate_id(),
            user_id: actor.user_id.clone(),
            status: OrderStatus::Pending,
            lines,
            price_cents: None,
            created_at: now,
            updated_at: now,
        };
        // A total past i64 cents rejects the order; `tx` rolls back.
        let total = order.lines_total()?;
        order.price_cents = Some(total.cents());

        OrderRepository::insert_on(&mut tx, &order).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            lines = order.lines.len(),
            total = %total,
            "Order placed"
        );
        Ok(order)
    }

    /// Pays a Pending order. Only its owner may pay.
    ///
    /// ## Errors
    /// `NotFound`, then `Forbidden` (not the owner), then `InvalidState`
    /// (not pending), then `InvalidInput` (card rejected).
    pub async fn pay(
        &self,
        actor: &Actor,
        order_id: &str,
        instrument: &PaymentInstrument,
    ) -> EngineResult<Order> {
        let order = self.owned(actor, order_id).await?;
        ensure_can(&order, OrderStatus::Completed, "pay")?;
        instrument.validate(self.clock.today())?;

        if !self
            .db
            .orders()
            .mark_completed(order_id, self.clock.now())
            .await?
        {
            // Lost to a concurrent transition
            let current = self.fetch(order_id).await?;
            return Err(invalid_status(&current, "pay").into());
        }

        info!(
            order_id = %order_id,
            user_id = %actor.user_id,
            card_last4 = %instrument.last4(),
            "Order paid"
        );
        self.fetch(order_id).await
    }

    /// Cancels a Pending order and returns its stock.
    ///
    /// The stock released is read from the order's persisted lines. `items`
    /// is what the caller believes the order holds; every product it names
    /// must exist, and a mismatch with the persisted lines is only logged.
    ///
    /// ## Errors
    /// `NotFound` (order), `Forbidden` (not the owner), `InvalidState`
    /// (not pending), `NotFound` (a product named in `items`).
    pub async fn cancel(
        &self,
        actor: &Actor,
        order_id: &str,
        items: &[LineItemRequest],
    ) -> EngineResult<Order> {
        let order = self.owned(actor, order_id).await?;
        ensure_can(&order, OrderStatus::Cancelled, "cancel")?;
        self.check_claimed_items(&order, items).await?;

        let mut tx = self.db.begin().await?;
        if !OrderRepository::mark_cancelled_on(&mut tx, order_id, self.clock.now()).await? {
            drop(tx);
            let current = self.fetch(order_id).await?;
            return Err(invalid_status(&current, "cancel").into());
        }

        let lines = OrderRepository::lines_on(&mut tx, order_id).await?;
        for line in &lines {
            self.inventory
                .release_on(&mut tx, &line.product_id, line.quantity)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order_id,
            user_id = %actor.user_id,
            released_lines = lines.len(),
            "Order cancelled"
        );
        self.fetch(order_id).await
    }

    /// Gets an order. Visible to its owner and to earnings viewers.
    pub async fn get(&self, actor: &Actor, order_id: &str) -> EngineResult<Order> {
        validate_id("order_id", order_id)?;
        let order = self.fetch(order_id).await?;
        if !actor.may_act_for(&order.user_id, Capability::ViewEarnings) {
            return Err(CoreError::forbidden(format!(
                "order {order_id} belongs to another user"
            ))
            .into());
        }
        Ok(order)
    }

    /// The actor's own orders, newest first.
    pub async fn list_for_user(&self, actor: &Actor) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().list_for_user(&actor.user_id).await?)
    }

    /// Completed-order earnings for today, this week and this month.
    pub async fn earnings_summary(&self, actor: &Actor) -> EngineResult<EarningsSummary> {
        self.earnings.summary(actor, EarningsSource::Orders).await
    }

    async fn fetch(&self, order_id: &str) -> EngineResult<Order> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;
        Ok(order)
    }

    /// Loads an order its owner is about to transition.
    async fn owned(&self, actor: &Actor, order_id: &str) -> EngineResult<Order> {
        validate_id("order_id", order_id)?;
        let order = self.fetch(order_id).await?;
        if order.user_id != actor.user_id {
            return Err(CoreError::forbidden(format!(
                "order {order_id} belongs to another user"
            ))
            .into());
        }
        Ok(order)
    }

    async fn check_claimed_items(
        &self,
        order: &Order,
        items: &[LineItemRequest],
    ) -> EngineResult<()> {
        for item in items {
            validate_id("product_id", &item.product_id)?;
            if self.db.products().get_by_id(&item.product_id).await?.is_none() {
                return Err(CoreError::not_found("Product", &item.product_id).into());
            }
        }

        if !items.is_empty() && !same_lines(&order.lines, items) {
            warn!(
                order_id = %order.id,
                claimed = items.len(),
                persisted = order.lines.len(),
                "Cancel request lines differ from the order; releasing persisted lines"
            );
        }
        Ok(())
    }
}

fn ensure_can(order: &Order, next: OrderStatus, operation: &str) -> Result<(), CoreError> {
    if order.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(invalid_status(order, operation))
    }
}

fn invalid_status(order: &Order, operation: &str) -> CoreError {
    CoreError::InvalidOrderStatus {
        order_id: order.id.clone(),
        status: order.status,
        operation: operation.to_string(),
    }
}

fn same_lines(lines: &[OrderLine], items: &[LineItemRequest]) -> bool {
    let mut persisted: Vec<(&str, i64)> = lines
        .iter()
        .map(|l| (l.product_id.as_str(), l.quantity))
        .collect();
    let mut claimed: Vec<(&str, i64)> = items
        .iter()
        .map(|i| (i.product_id.as_str(), i.quantity))
        .collect();
    persisted.sort_unstable();
    claimed.sort_unstable();
    persisted == claimed
}

// =============================================================================
// Unit Tests
// =============================================================================
