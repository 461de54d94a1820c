//! Seeds the default chart of accounts.
//!
//! Accounts that already exist (by name, ignoring case) are left alone, so the
//! seeder can be run repeatedly.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::accounts::AccountService;
use tally_core::store::AccountFilter;
use tally_db::{SeaLedgerStore, connect};
use tally_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let accounts = AccountService::new(Arc::new(SeaLedgerStore::new(db)));

    let created = accounts.seed_default_chart().await?;
    for account in &created {
        info!(
            name = %account.name,
            account_type = %account.account_type,
            "Seeded account"
        );
    }

    let total = accounts.list(&AccountFilter::default()).await?.len();
    info!(created = created.len(), total, "Chart of accounts seeded");

    Ok(())
}
