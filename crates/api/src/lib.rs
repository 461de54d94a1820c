//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - JSON error mapping for ledger and application errors
//! - The HTTP payment gateway client
//! - Single retry of mutations that hit a concurrency conflict

pub mod error;
pub mod gateway;
pub mod retry;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tally_core::accounts::AccountService;
use tally_core::balance::BalanceAggregator;
use tally_core::gateway::PaymentGateway;
use tally_core::ledger::PostingEngine;
use tally_core::recorder::Recorder;
use tally_core::reports::{ReportBuilder, ReportSettings};
use tally_core::store::LedgerStore;
use tally_shared::config::LedgerConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chart of accounts.
    pub accounts: AccountService,
    /// Journal writes and lookups.
    pub engine: PostingEngine,
    /// Point-in-time balances.
    pub balances: BalanceAggregator,
    /// Transfers, payments and expenses.
    pub recorder: Recorder,
    /// Financial reports.
    pub reports: ReportBuilder,
}

impl AppState {
    /// Wires the ledger services over one store and gateway.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        ledger: &LedgerConfig,
    ) -> Self {
        let accounts = AccountService::new(store.clone());
        let engine = PostingEngine::new(store.clone());
        Self {
            recorder: Recorder::new(
                engine.clone(),
                accounts.clone(),
                gateway,
                ledger.currency.clone(),
            ),
            balances: BalanceAggregator::new(store.clone()),
            reports: ReportBuilder::new(
                store,
                ReportSettings {
                    currency: ledger.currency.clone(),
                    retained_earnings_label: ledger.retained_earnings_label.clone(),
                },
            ),
            accounts,
            engine,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
