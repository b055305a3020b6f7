//! Database migration runner for the top-up service.
//!
//! Reads `DATABASE_URL` from the environment (or `.env`).
//!
//! Usage:
//!   migrator up      - Apply pending wallet schema migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show which migrations are applied
//!   migrator fresh   - Drop the wallet tables and re-apply everything

use sea_orm_migration::prelude::*;
use topup_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // sea-orm-migration's CLI installs its own tracing subscriber.
    cli::run_cli(Migrator).await;
}
