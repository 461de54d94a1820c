//! Transfer routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tally_core::ledger::LedgerError;
use tally_core::recorder::NewTransfer;
use tally_shared::types::{AccountId, PageRequest, PageResponse};

use crate::AppState;
use crate::error::ledger_error_response;
use crate::retry::retry_once;

/// Creates the transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/transfers", get(list_transfers).post(create_transfer))
}

/// Refuses accounts money cannot be transferred between.
async fn check_transferable(state: &AppState, id: AccountId) -> Result<(), LedgerError> {
    let account = state.accounts.get(id).await?;
    if account.account_type.is_bank_like() {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "'{}' is a {} account; transfers need Bank, Other Current Assets or Credit Card accounts",
            account.name, account.account_type
        )))
    }
}

/// POST `/transfers` - Move money between two bank-like accounts.
async fn create_transfer(
    State(state): State<AppState>,
    Json(payload): Json<NewTransfer>,
) -> Response {
    if payload.from_account_id != payload.to_account_id {
        for id in [payload.from_account_id, payload.to_account_id] {
            if let Err(e) = check_transferable(&state, id).await {
                return ledger_error_response(&e, "Transfer refused");
            }
        }
    }

    match retry_once("create_transfer", || state.recorder.transfer(payload.clone())).await {
        Ok(transfer) => (StatusCode::CREATED, Json(transfer)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to record transfer"),
    }
}

/// GET `/transfers` - List transfers, newest first.
async fn list_transfers(State(state): State<AppState>, Query(page): Query<PageRequest>) -> Response {
    match state.recorder.transfers().await {
        Ok(transfers) => {
            (StatusCode::OK, Json(PageResponse::from_vec(transfers, page))).into_response()
        }
        Err(e) => ledger_error_response(&e, "Failed to list transfers"),
    }
}
