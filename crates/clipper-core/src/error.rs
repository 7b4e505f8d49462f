//! # Error Types
//!
//! The engine error taxonomy.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  clipper-core (this file)                                              │
//! │  ├── CoreError        - Domain failures, each with a stable ErrorKind  │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  clipper-db                                                            │
//! │  └── DbError          - Store failures                                 │
//! │                                                                         │
//! │  clipper-engine                                                        │
//! │  ├── EngineError      - CoreError | DbError                            │
//! │  └── ApiError         - What the web layer serializes                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The variant tells the caller *what* failed; [`CoreError::kind`] tells the
//! boundary *which class* of failure it was, which is what status codes are
//! derived from.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable failure classes exposed at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Referenced entity is absent.
    NotFound,
    /// Resource already held (double booking, race loser).
    Conflict,
    /// Stock too low.
    InsufficientResource,
    /// Terminal order mutated, rest day or past slot requested.
    InvalidState,
    /// Caller is not the owner or lacks a capability.
    Forbidden,
    /// Malformed input.
    InvalidInput,
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by the ledgers and the order lifecycle.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity cannot be found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The referenced user exists but cannot take bookings.
    #[error("User {user_id} is not a barber")]
    NotABarber { user_id: String },

    /// The (barber, date, slot) triple already has a live booking.
    ///
    /// ## When This Occurs
    /// ```text
    /// create(B, 2024-06-03, 09:00)  ──► ok
    /// create(B, 2024-06-03, 09:00)  ──► SlotTaken   (sequential)
    ///
    /// create(B, d, s) ─┐
    ///                  ├──► one ok, one SlotTaken  (concurrent, decided
    /// create(B, d, s) ─┘                            by the unique index)
    /// ```
    #[error("Slot {time_slot_id} on {date} is not available for barber {barber_id}")]
    SlotTaken {
        barber_id: String,
        date: NaiveDate,
        time_slot_id: String,
    },

    /// The requested date is the shop's rest day.
    #[error("{date} is not a working day")]
    RestDay { date: NaiveDate },

    /// The requested slot has already started or the date is in the past.
    #[error("Slot starting {start_time} on {date} is in the past")]
    SlotInPast { date: NaiveDate, start_time: NaiveTime },

    /// Not enough stock to back an order line.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The order is not in a state that allows the requested operation.
    #[error("Order {order_id} is {status}, cannot {operation}")]
    InvalidOrderStatus {
        order_id: String,
        status: OrderStatus,
        operation: String,
    },

    /// Caller is not the owner of the resource or lacks a capability.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Forbidden error.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden {
            reason: reason.into(),
        }
    }

    /// Returns the stable failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::SlotTaken { .. } => ErrorKind::Conflict,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientResource,
            CoreError::RestDay { .. }
            | CoreError::SlotInPast { .. }
            | CoreError::InvalidOrderStatus { .. } => ErrorKind::InvalidState,
            CoreError::Forbidden { .. } => ErrorKind::Forbidden,
            CoreError::NotABarber { .. } | CoreError::Validation(_) => ErrorKind::InvalidInput,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before any ledger is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed card number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A dated value is no longer valid (card expiry).
    #[error("{field} has expired")]
    Expired { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "pomade".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for pomade: available 3, requested 5"
        );

        let err = CoreError::InvalidOrderStatus {
            order_id: "o-1".to_string(),
            status: OrderStatus::Completed,
            operation: "pay".to_string(),
        };
        assert_eq!(err.to_string(), "Order o-1 is completed, cannot pay");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::not_found("Service", "x").kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::SlotTaken {
                barber_id: "b".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                time_slot_id: "s".to_string(),
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(CoreError::forbidden("nope").kind(), ErrorKind::Forbidden);
        assert_eq!(
            CoreError::NotABarber {
                user_id: "u".to_string()
            }
            .kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "card_number".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::InvalidInput);
    }
}
