//! Tally API Server
//!
//! Main entry point for the ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::gateway::HttpPaymentGateway;
use tally_api::{AppState, create_router};
use tally_core::gateway::{DisabledGateway, PaymentGateway};
use tally_core::store::{InMemoryLedgerStore, LedgerStore};
use tally_db::{SeaLedgerStore, connect};
use tally_shared::AppConfig;
use tally_shared::config::StoreBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let store: Arc<dyn LedgerStore> = match config.ledger.store {
        StoreBackend::Postgres => {
            let db = connect(&config.database).await?;
            info!("Connected to database");
            Arc::new(SeaLedgerStore::new(db))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory ledger store; postings are lost on restart");
            Arc::new(InMemoryLedgerStore::new())
        }
    };

    let gateway: Arc<dyn PaymentGateway> = match &config.gateway {
        Some(gateway) => {
            info!(base_url = %gateway.base_url, "Payment gateway configured");
            Arc::new(HttpPaymentGateway::new(gateway)?)
        }
        None => {
            info!("No payment gateway configured; card payments will be refused");
            Arc::new(DisabledGateway)
        }
    };

    let state = AppState::new(store, gateway, &config.ledger);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(currency = %config.ledger.currency, "Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
