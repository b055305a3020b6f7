//! Database seeder for top-up development and testing.
//!
//! Seeds a handful of wallet users with fixed IDs and opening balances so
//! the verify/confirm flow can be exercised against a fresh database.
//!
//! Usage: cargo run --bin seeder

use rust_decimal::Decimal;
use topup_db::UserRepository;
use topup_shared::AppConfig;
use uuid::Uuid;

/// Fixed development users: (ID, opening balance in cents).
const SEED_USERS: &[(&str, i64)] = &[
    ("00000000-0000-0000-0000-000000000001", 10_000),
    ("00000000-0000-0000-0000-000000000002", 0),
    ("00000000-0000-0000-0000-000000000003", 250_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    if config.database.is_in_memory() {
        anyhow::bail!("database.url points at the in-memory store; nothing to seed");
    }

    println!("Connecting to database...");
    let db = topup_db::connect(&config.database).await?;
    let users = UserRepository::new(db);

    println!("Seeding wallet users...");
    for &(id, cents) in SEED_USERS {
        seed_user(&users, Uuid::parse_str(id)?, Decimal::new(cents, 2)).await?;
    }

    println!("Seeding complete!");
    Ok(())
}

/// Creates a user unless one with the same ID already exists.
async fn seed_user(users: &UserRepository, id: Uuid, balance: Decimal) -> anyhow::Result<()> {
    if users.find_by_id(id).await?.is_some() {
        println!("  User {id} already exists, skipping...");
        return Ok(());
    }

    users.create(id, balance).await?;
    println!("  Created user {id} with balance {balance}");
    Ok(())
}
