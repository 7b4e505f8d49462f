//! # Repository Module
//!
//! Database repository implementations for Clipper.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Engine component                                                       │
//! │       │                                                                 │
//! │       │  db.bookings().held_slot_ids(barber, date)                      │
//! │       ▼                                                                 │
//! │  BookingRepository                                                      │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories hold a cloned pool. Operations that must join a caller's
//! transaction are associated functions taking `&mut SqliteConnection`
//! (suffix `_on`); pass `&mut *tx`.
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Users and their roles
//! - [`service::ServiceRepository`] - Offered services
//! - [`slot::TimeSlotRepository`] - The time slot catalog
//! - [`booking::BookingRepository`] - Bookings and live-slot lookups
//! - [`product::ProductRepository`] - Products and conditional stock moves
//! - [`order::OrderRepository`] - Orders, lines and status transitions

pub mod booking;
pub mod order;
pub mod product;
pub mod service;
pub mod slot;
pub mod user;

use uuid::Uuid;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveTime, Utc};
    use clipper_core::{Product, Role, Service, TimeSlot, User};

    use super::generate_id;
    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn user(db: &Database, name: &str, role: Role) -> User {
        let user = User {
            id: generate_id(),
            name: name.to_string(),
            role,
        };
        db.users().insert(&user).await.unwrap();
        user
    }

    pub async fn service(db: &Database, price_cents: i64) -> Service {
        let service = Service {
            id: generate_id(),
            name: "Haircut".to_string(),
            price_cents,
            duration_minutes: 30,
        };
        db.services().insert(&service).await.unwrap();
        service
    }

    pub async fn slot(db: &Database, hour: u32) -> TimeSlot {
        db.time_slots()
            .insert(
                NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn product(db: &Database, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: "Pomade".to_string(),
            price_cents,
            stock,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }
}
