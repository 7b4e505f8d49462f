//! # Seed Data Generator
//!
//! Populates a database with a working shop for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p clipper-db --bin seed
//! cargo run -p clipper-db --bin seed -- --db ./data/clipper.db
//! CLIPPER_DB_PATH=./data/clipper.db cargo run -p clipper-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Hourly time slots 09:00-18:00
//! - Services with prices and durations
//! - One admin, two barbers, one client
//! - Products with starting stock

use std::env;

use chrono::{NaiveTime, Utc};
use clipper_core::{Product, Role, Service, User};
use clipper_db::{generate_id, Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const OPENING_HOUR: u32 = 9;
const CLOSING_HOUR: u32 = 18;

/// (name, price in cents, minutes)
const SERVICES: &[(&str, i64, i64)] = &[
    ("Haircut", 2500, 30),
    ("Beard Trim", 1500, 20),
    ("Haircut & Beard", 3500, 50),
    ("Hot Towel Shave", 3000, 40),
    ("Kids Cut", 1800, 25),
];

/// (name, price in cents, stock)
const PRODUCTS: &[(&str, i64, i64)] = &[
    ("Matte Pomade", 1800, 24),
    ("Beard Oil", 1600, 18),
    ("Sea Salt Spray", 1400, 12),
    ("Wooden Comb", 600, 40),
    ("Aftershave Balm", 2200, 10),
    ("Shampoo 250ml", 1200, 30),
];

/// (name, role)
const USERS: &[(&str, Role)] = &[
    ("Admin", Role::Admin),
    ("Marco", Role::Worker),
    ("Lena", Role::Worker),
    ("Demo Client", Role::Client),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,clipper=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut db_path = env::var("CLIPPER_DB_PATH").unwrap_or_else(|_| "./clipper_dev.db".to_string());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Clipper Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $CLIPPER_DB_PATH or ./clipper_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    if !db.time_slots().list().await?.is_empty() {
        info!("Database already seeded, nothing to do");
        return Ok(());
    }

    for hour in OPENING_HOUR..CLOSING_HOUR {
        let start = NaiveTime::from_hms_opt(hour, 0, 0).ok_or("invalid slot hour")?;
        let end = NaiveTime::from_hms_opt(hour + 1, 0, 0).ok_or("invalid slot hour")?;
        db.time_slots().insert(start, end).await?;
    }
    info!(count = CLOSING_HOUR - OPENING_HOUR, "Time slots created");

    for (name, price_cents, duration_minutes) in SERVICES {
        let service = Service {
            id: generate_id(),
            name: (*name).to_string(),
            price_cents: *price_cents,
            duration_minutes: *duration_minutes,
        };
        db.services().insert(&service).await?;
    }
    info!(count = SERVICES.len(), "Services created");

    for (name, role) in USERS {
        let user = User {
            id: generate_id(),
            name: (*name).to_string(),
            role: *role,
        };
        db.users().insert(&user).await?;
        info!(id = %user.id, name = %user.name, role = ?user.role, "User created");
    }

    let now = Utc::now();
    for (name, price_cents, stock) in PRODUCTS {
        let product = Product {
            id: generate_id(),
            name: (*name).to_string(),
            price_cents: *price_cents,
            stock: *stock,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
    }
    info!(count = PRODUCTS.len(), "Products created");

    db.close().await;
    info!("Seed complete");
    Ok(())
}
