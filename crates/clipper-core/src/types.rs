//! # Domain Types
//!
//! Core domain records used throughout Clipper.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TimeSlot     │◄──│     Booking     │──►│     Service     │       │
//! │  │  start, end     │   │  barber, date   │   │  price, minutes │       │
//! │  └─────────────────┘   │  status         │   └─────────────────┘       │
//! │                        └────────┬────────┘                              │
//! │                                 │ user / barber                         │
//! │                        ┌────────▼────────┐                              │
//! │                        │      User       │                              │
//! │                        │  role           │                              │
//! │                        └────────▲────────┘                              │
//! │                                 │ user                                  │
//! │  ┌─────────────────┐   ┌────────┴────────┐                              │
//! │  │    Product      │◄──│      Order      │                              │
//! │  │  price, stock   │   │  status, lines  │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity is keyed by a UUID v4 string generated by the store layer.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::access::Role;
use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

// =============================================================================
// Time Slot
// =============================================================================

/// A bookable interval from the administered catalog.
///
/// Slots are trusted input: the engine does not check them for overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TimeSlot {
    pub id: String,
    #[ts(as = "String")]
    pub start_time: NaiveTime,
    #[ts(as = "String")]
    pub end_time: NaiveTime,
}

// =============================================================================
// Service
// =============================================================================

/// A service offered by the shop. Read-only from the engine's side.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i64,
}

// =============================================================================
// User
// =============================================================================

/// A registered user: client, barber (worker) or admin.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
}

// =============================================================================
// Booking
// =============================================================================

/// Status of a booking.
///
/// Cancellation is a soft delete: the record stays, with status
/// `Cancelled`, and stops counting as live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Live: holds its (barber, date, slot) triple.
    Confirmed,
    /// Released: kept for history and aggregation only.
    Cancelled,
}

impl BookingStatus {
    /// Whether the booking currently holds its slot.
    #[inline]
    pub const fn is_live(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }
}

/// A booking of one barber's time slot on one date.
///
/// ## Invariant
/// At most one live booking exists per (barber_id, date, time_slot_id).
/// The store enforces this with a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub barber_id: String,
    pub service_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub time_slot_id: String,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The five mutable fields of a booking, as requested by a client.
///
/// Used for both `create` and `edit`: an edit replaces all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingRequest {
    pub service_id: String,
    pub barber_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub time_slot_id: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product sold over the counter.
///
/// ## Invariant
/// `stock >= 0`. Stock only moves through reservation (order creation)
/// and restitution (order cancellation), plus administrative restocking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of a purchase order.
///
/// ## State Machine
/// ```text
///              pay (valid card)
///   Pending ─────────────────────► Completed   (terminal, stock untouched)
///      │
///      │ cancel
///      ▼
///   Cancelled                                  (terminal, stock restored)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Stock reserved, awaiting payment.
    Pending,
    /// Paid.
    Completed,
    /// Cancelled, stock restored.
    Cancelled,
}

impl OrderStatus {
    /// Completed and Cancelled accept no further transition.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Checks whether moving from `self` to `next` is a legal transition.
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }

    /// Lowercase name, as stored.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A line of an order.
/// Uses snapshot pattern to freeze product data at reservation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub product_id: String,
    /// Product name at reservation time (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at reservation time (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl OrderLine {
    /// Line total (unit price × quantity), `None` if it overflows.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).checked_mul(self.quantity)
    }
}

/// A purchase order.
///
/// ## Invariant
/// `price_cents` is the sum of the line totals, fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    /// Computed total; `None` only for rows written before pricing.
    pub price_cents: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sums the frozen line totals.
    ///
    /// ## Errors
    /// `OutOfRange` on `price` if a line total or the sum exceeds `i64`.
    pub fn lines_total(&self) -> ValidationResult<Money> {
        self.lines
            .iter()
            .try_fold(Money::zero(), |total, line| {
                line.line_total().and_then(|amount| total.checked_add(amount))
            })
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "price".to_string(),
                min: 0,
                max: i64::MAX,
            })
    }
}

/// A requested order line: product and quantity, as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl LineItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        LineItemRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
