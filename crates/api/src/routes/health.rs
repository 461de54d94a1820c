//! Liveness and readiness probes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tally_core::store::AccountFilter;
use tracing::warn;

use crate::AppState;

/// Probe response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `healthy`, `ready` or `unavailable`.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Creates the health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ready once the ledger store answers a query.
async fn readiness(State(state): State<AppState>) -> Response {
    match state.accounts.list(&AccountFilter::default()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                version: env!("CARGO_PKG_VERSION"),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Ledger store not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    version: env!("CARGO_PKG_VERSION"),
                }),
            )
                .into_response()
        }
    }
}
