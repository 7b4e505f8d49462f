//! # clipper-db: Database Layer for Clipper
//!
//! SQLite storage for the barbershop engine, through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Clipper Data Flow                                │
//! │                                                                         │
//! │  clipper-engine (BookingLedger::create)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     clipper-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ booking.rs    │    │  (embedded)  │  │   │
//! │  │   │               │    │ product.rs    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ order.rs      │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │ slot.rs ...   │    │ 002_idx.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clipper_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/clipper.db")).await?;
//! let slots = db.time_slots().list().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::booking::BookingRepository;
pub use repository::generate_id;
pub use repository::order::OrderRepository;
pub use repository::product::{ProductRepository, Reservation, Restitution};
pub use repository::service::ServiceRepository;
pub use repository::slot::TimeSlotRepository;
pub use repository::user::UserRepository;
