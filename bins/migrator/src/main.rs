//! Database migration runner for the ledger schema.
//!
//! Usage:
//!   migrator up      - Create the ledger tables, triggers and counters
//!   migrator down    - Drop them again
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop everything and re-run
//!
//! The connection string comes from `DATABASE_URL`.

use sea_orm_migration::prelude::*;
use tally_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
