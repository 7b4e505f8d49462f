//! # clipper-engine: Reservation & Inventory Consistency Engine
//!
//! The operations a barbershop web layer calls: listing slots, resolving
//! availability, booking, ordering products and reading earnings.
//!
//! ## Component Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Engine                                     │
//! │                                                                         │
//! │  catalog()       TimeSlotCatalog       ordered slot list                │
//! │  availability()  AvailabilityResolver  catalog − live bookings          │
//! │  bookings()      BookingLedger         admission + unique live triple   │
//! │  inventory()     InventoryLedger       conditional stock moves          │
//! │  orders()        OrderLifecycle        Pending → Completed | Cancelled  │
//! │  earnings()      EarningsAggregator    daily / weekly / monthly sums    │
//! │                                                                         │
//! │                 all share one Database and one Clock                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every component is a cheap handle; build them on demand from an
//! [`Engine`]. Concurrent callers are serialized only by the store:
//! a unique index for bookings, conditional updates for stock and order
//! status.

pub mod admission;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod earnings;
pub mod error;
pub mod inventory;
pub mod orders;

use std::sync::Arc;

use clipper_core::{Clock, SystemClock};
use clipper_db::Database;

pub use config::{ConfigError, EngineConfig};
pub use error::{ApiError, EngineError, EngineResult, ErrorCode};

use crate::admission::Admission;
use crate::availability::AvailabilityResolver;
use crate::booking::BookingLedger;
use crate::catalog::TimeSlotCatalog;
use crate::earnings::EarningsAggregator;
use crate::inventory::InventoryLedger;
use crate::orders::OrderLifecycle;

/// Entry point holding the store, the clock and the configuration.
#[derive(Clone)]
pub struct Engine {
    db: Database,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine on the system clock.
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self::with_clock(db, config, Arc::new(SystemClock))
    }

    /// Creates an engine reading time from `clock`.
    pub fn with_clock(db: Database, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Engine { db, clock, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn catalog(&self) -> TimeSlotCatalog {
        TimeSlotCatalog::new(self.db.clone())
    }

    pub fn availability(&self) -> AvailabilityResolver {
        AvailabilityResolver::new(
            self.db.clone(),
            self.clock.clone(),
            self.config.work_week(),
            self.config.booking_window_days,
            self.config.utc_offset,
        )
    }

    pub fn bookings(&self) -> BookingLedger {
        let admission = Admission::new(
            self.db.clone(),
            self.clock.clone(),
            self.config.work_week(),
            self.config.utc_offset,
        );
        BookingLedger::new(self.db.clone(), self.clock.clone(), admission)
    }

    pub fn inventory(&self) -> InventoryLedger {
        InventoryLedger::new(self.db.clone(), self.clock.clone())
    }

    pub fn orders(&self) -> OrderLifecycle {
        OrderLifecycle::new(
            self.db.clone(),
            self.clock.clone(),
            self.inventory(),
            self.earnings(),
            self.config.max_item_quantity,
        )
    }

    pub fn earnings(&self) -> EarningsAggregator {
        EarningsAggregator::new(self.db.clone(), self.clock.clone())
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime, Utc};
    use clipper_core::{
        Actor, Booking, BookingRequest, Clock, FixedClock, Product, Role, Service, TimeSlot, User,
    };
    use clipper_db::{generate_id, Database, DbConfig};

    use crate::{Engine, EngineConfig, EngineResult};

    /// A shop with an admin, two barbers, one client, one service and four
    /// morning slots, frozen at Monday 2024-06-03 10:30 UTC.
    #[derive(Clone)]
    pub struct Shop {
        pub engine: Engine,
        pub db: Database,
        pub clock: Arc<dyn Clock>,
        pub admin: User,
        pub barber: User,
        pub second_barber: User,
        pub client: User,
        pub service: Service,
        pub slots: Vec<TimeSlot>,
    }

    pub async fn shop() -> Shop {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        populate(db).await
    }

    /// A shop on a file database with several connections, for races.
    pub async fn file_shop() -> (Shop, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("clipper.db")).max_connections(8);
        let db = Database::new(config).await.unwrap();
        (populate(db).await, dir)
    }

    async fn populate(db: Database) -> Shop {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(date, 10, 30).unwrap());

        let admin = user(&db, "Admin", Role::Admin).await;
        let barber = user(&db, "Marco", Role::Worker).await;
        let second_barber = user(&db, "Lena", Role::Worker).await;
        let client = user(&db, "Client", Role::Client).await;

        let service = Service {
            id: generate_id(),
            name: "Haircut".to_string(),
            price_cents: 2500,
            duration_minutes: 30,
        };
        db.services().insert(&service).await.unwrap();

        let mut slots = Vec::new();
        for hour in 9..13 {
            let slot = db
                .time_slots()
                .insert(
                    NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
                )
                .await
                .unwrap();
            slots.push(slot);
        }

        let engine = Engine::with_clock(db.clone(), EngineConfig::default(), clock.clone());
        Shop {
            engine,
            db,
            clock,
            admin,
            barber,
            second_barber,
            client,
            service,
            slots,
        }
    }

    async fn user(db: &Database, name: &str, role: Role) -> User {
        let user = User {
            id: generate_id(),
            name: name.to_string(),
            role,
        };
        db.users().insert(&user).await.unwrap();
        user
    }

    impl Shop {
        pub fn today(&self) -> NaiveDate {
            self.clock.today()
        }

        pub fn client_actor(&self) -> Actor {
            Actor::new(&self.client.id, Role::Client)
        }

        pub fn admin_actor(&self) -> Actor {
            Actor::new(&self.admin.id, Role::Admin)
        }

        pub fn barber_actor(&self) -> Actor {
            Actor::new(&self.barber.id, Role::Worker)
        }

        /// A request for the shop's service with the first barber.
        pub fn request(&self, date: NaiveDate, slot: usize) -> BookingRequest {
            BookingRequest {
                service_id: self.service.id.clone(),
                barber_id: self.barber.id.clone(),
                date,
                time_slot_id: self.slots[slot].id.clone(),
            }
        }

        pub async fn book(&self, actor: &Actor, date: NaiveDate, slot: usize) -> EngineResult<Booking> {
            self.engine.bookings().create(actor, self.request(date, slot)).await
        }

        /// A product named "Pomade".
        pub async fn product(&self, price_cents: i64, stock: i64) -> Product {
            let now = Utc::now();
            let product = Product {
                id: generate_id(),
                name: "Pomade".to_string(),
                price_cents,
                stock,
                created_at: now,
                updated_at: now,
            };
            self.db.products().insert(&product).await.unwrap();
            product
        }
    }
}
