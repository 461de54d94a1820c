//! Invoice and bill routes.
//!
//! These post the ledger effect only; each responds with the journal entry.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tally_core::recorder::{NewBill, NewBillPayment, NewInvoice};

use crate::AppState;
use crate::error::ledger_error_response;
use crate::retry::retry_once;

/// Creates the invoice and bill routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(create_invoice))
        .route("/bills", post(create_bill))
        .route("/bill-payments", post(create_bill_payment))
}

/// POST `/invoices` - Book a customer invoice to Accounts Receivable.
async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<NewInvoice>,
) -> Response {
    match retry_once("create_invoice", || state.recorder.record_invoice(payload.clone())).await {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to record invoice"),
    }
}

/// POST `/bills` - Book a supplier bill to Accounts Payable.
async fn create_bill(State(state): State<AppState>, Json(payload): Json<NewBill>) -> Response {
    match retry_once("create_bill", || state.recorder.record_bill(payload.clone())).await {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to record bill"),
    }
}

/// POST `/bill-payments` - Pay down Accounts Payable.
async fn create_bill_payment(
    State(state): State<AppState>,
    Json(payload): Json<NewBillPayment>,
) -> Response {
    let result = retry_once("create_bill_payment", || {
        state.recorder.record_bill_payment(payload.clone())
    })
    .await;
    match result {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to record bill payment"),
    }
}
