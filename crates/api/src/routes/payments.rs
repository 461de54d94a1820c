//! Payment routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tally_core::recorder::NewPayment;
use tally_shared::types::{PageRequest, PageResponse};

use crate::AppState;
use crate::error::ledger_error_response;
use crate::retry::retry_once;

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/payments", get(list_payments).post(create_payment))
}

/// POST `/payments` - Record a payment received or disbursed.
///
/// Card payments received are captured at the gateway first and refunded if
/// the posting fails.
async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<NewPayment>,
) -> Response {
    match retry_once("create_payment", || state.recorder.record_payment(payload.clone())).await {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to record payment"),
    }
}

/// GET `/payments` - List payments, newest first.
async fn list_payments(State(state): State<AppState>, Query(page): Query<PageRequest>) -> Response {
    match state.recorder.payments().await {
        Ok(payments) => (StatusCode::OK, Json(PageResponse::from_vec(payments, page))).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to list payments"),
    }
}
