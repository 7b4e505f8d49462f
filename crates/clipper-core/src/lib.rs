//! # clipper-core: Pure Domain Logic for Clipper
//!
//! This crate holds the barbershop domain model and every decision that can
//! be made without touching the store: slot arithmetic, the rest-day policy,
//! earnings windows, input and payment-instrument validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Clipper Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Web layer (external: routing, sessions)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Actor + validated intent               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 clipper-engine (ledgers, lifecycle)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ clipper-core (THIS CRATE) ★                       │   │
//! │  │   types • access • money • schedule • earnings • payment        │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 clipper-db (SQLite repositories)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (TimeSlot, Booking, Order, Product, Service, User)
//! - [`access`] - Roles, capabilities and the calling [`Actor`]
//! - [`money`] - Integer-cent money
//! - [`schedule`] - Rest-day policy and free-slot computation
//! - [`earnings`] - Windowed sums and per-day series
//! - [`payment`] - Card format/expiry checks
//! - [`clock`] - Injectable time source
//! - [`error`] - The engine error taxonomy
//! - [`validation`] - Field-level input checks

pub mod access;
pub mod clock;
pub mod earnings;
pub mod error;
pub mod money;
pub mod payment;
pub mod schedule;
pub mod types;
pub mod validation;

pub use access::{Actor, Capability, Role};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum quantity of a single product on one order line.
///
/// Catches typos such as 1000 instead of 10. Overridable through the
/// engine configuration.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default length of the availability window shown to clients, in days.
pub const DEFAULT_BOOKING_WINDOW_DAYS: u32 = 14;
