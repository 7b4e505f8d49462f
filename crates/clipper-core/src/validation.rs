//! # Validation Module
//!
//! Input validation utilities for Clipper.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web layer (external)                                         │
//! │  └── Deserialization, authentication                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine admission pipeline                                    │
//! │  ├── THIS MODULE: field rules (ids, quantities, line items)            │
//! │  └── existence / capability / schedule / exclusivity checks            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (barber, date, slot) for live bookings                     │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{BookingRequest, LineItemRequest};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an entity identifier (UUID format).
///
/// ## Example
/// ```rust
/// use clipper_core::validation::validate_id;
///
/// assert!(validate_id("service_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("service_id", "").is_err());
/// assert!(validate_id("service_id", "not-a-uuid").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates the identifier fields of a booking request.
pub fn validate_booking_request(request: &BookingRequest) -> ValidationResult<()> {
    validate_id("service_id", &request.service_id)?;
    validate_id("barber_id", &request.barber_id)?;
    validate_id("time_slot_id", &request.time_slot_id)?;
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `max`
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the requested lines of an order.
///
/// ## Rules
/// - At least one line
/// - Every product id well-formed
/// - Every quantity in `1..=max_quantity`
pub fn validate_line_items(items: &[LineItemRequest], max_quantity: i64) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    for item in items {
        validate_id("product_id", &item.product_id)?;
        validate_quantity(item.quantity, max_quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_ITEM_QUANTITY;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", ID).is_ok());
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", "   ").is_err());
        assert!(validate_id("id", "123").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1, MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(999, MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_quantity(0, MAX_ITEM_QUANTITY).is_err());
        assert!(validate_quantity(-1, MAX_ITEM_QUANTITY).is_err());
        assert!(validate_quantity(1000, MAX_ITEM_QUANTITY).is_err());
    }

    #[test]
    fn test_validate_line_items() {
        assert!(validate_line_items(&[LineItemRequest::new(ID, 2)], 10).is_ok());
        assert!(validate_line_items(&[], 10).is_err());
        assert!(validate_line_items(&[LineItemRequest::new(ID, 11)], 10).is_err());
        assert!(validate_line_items(&[LineItemRequest::new("nope", 1)], 10).is_err());
    }
}
