//! Chart of accounts routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::ledger::{AccountUpdate, NewAccount};
use tally_core::store::AccountFilter;
use tally_shared::types::{AccountId, PageRequest, PageResponse};
use tracing::info;
use uuid::Uuid;

use super::today;
use crate::AppState;
use crate::error::ledger_error_response;
use crate::retry::retry_once;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{account_id}", get(get_account).put(update_account))
        .route("/accounts/{account_id}/balance", get(get_account_balance))
}

/// Query parameters for an account balance.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Balance through the end of this date. Defaults to today.
    pub as_of: Option<NaiveDate>,
}

/// GET `/accounts` - List accounts in report order.
async fn list_accounts(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
    Query(page): Query<PageRequest>,
) -> Response {
    match state.accounts.list(&filter).await {
        Ok(accounts) => (StatusCode::OK, Json(PageResponse::from_vec(accounts, page))).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to list accounts"),
    }
}

/// POST `/accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<NewAccount>,
) -> Response {
    match state.accounts.create(payload).await {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to create account"),
    }
}

/// GET `/accounts/{account_id}` - Get one account.
async fn get_account(State(state): State<AppState>, Path(account_id): Path<Uuid>) -> Response {
    match state.accounts.get(AccountId::from(account_id)).await {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to get account"),
    }
}

/// PUT `/accounts/{account_id}` - Update an account.
async fn update_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<AccountUpdate>,
) -> Response {
    let id = AccountId::from(account_id);
    let result = retry_once("update_account", || state.accounts.update(id, payload.clone())).await;
    match result {
        Ok(account) => {
            info!(account_id = %account.id, is_active = account.is_active, "Account updated");
            (StatusCode::OK, Json(account)).into_response()
        }
        Err(e) => ledger_error_response(&e, "Failed to update account"),
    }
}

/// GET `/accounts/{account_id}/balance` - Balance as of a date.
async fn get_account_balance(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<BalanceQuery>,
) -> Response {
    let as_of = query.as_of.unwrap_or_else(today);
    match state
        .balances
        .balance_as_of(AccountId::from(account_id), as_of)
        .await
    {
        Ok(balance) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "as_of": as_of,
                "balance": balance,
            })),
        )
            .into_response(),
        Err(e) => ledger_error_response(&e, "Failed to get account balance"),
    }
}
