//! Journal entry routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::ledger::{LedgerError, PostingRequest, SourceKind};
use tally_core::store::TransactionFilter;
use tally_shared::types::{PageRequest, PageResponse, TransactionId};
use tracing::info;
use uuid::Uuid;

use super::today;
use crate::AppState;
use crate::error::ledger_error_response;
use crate::retry::retry_once;

/// Creates the journal entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journal-entries", get(list_entries).post(post_entry))
        .route("/journal-entries/{transaction_id}", get(get_entry))
        .route("/journal-entries/{transaction_id}/reverse", post(reverse_entry))
}

/// Request body for reversing an entry.
#[derive(Debug, Deserialize)]
pub struct ReverseRequest {
    /// Why the entry is reversed; appended to the memo.
    #[serde(default)]
    pub reason: String,
    /// Date of the reversing entry. Defaults to today.
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}

/// POST `/journal-entries` - Post a manual journal entry.
///
/// Other sources are written by their own routes, so only `journal` is accepted here.
async fn post_entry(State(state): State<AppState>, Json(payload): Json<PostingRequest>) -> Response {
    if payload.source != SourceKind::Journal {
        let e = LedgerError::Validation(format!(
            "source '{}' cannot be posted as a manual journal entry",
            payload.source.as_str()
        ));
        return ledger_error_response(&e, "Rejected journal entry source");
    }

    match retry_once("post_entry", || state.engine.post(payload.clone())).await {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to post journal entry"),
    }
}

/// GET `/journal-entries` - List entries by date, then entry number.
async fn list_entries(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
    Query(page): Query<PageRequest>,
) -> Response {
    match state.engine.transactions(&filter).await {
        Ok(transactions) => {
            (StatusCode::OK, Json(PageResponse::from_vec(transactions, page))).into_response()
        }
        Err(e) => ledger_error_response(&e, "Failed to list journal entries"),
    }
}

/// GET `/journal-entries/{transaction_id}` - Get one entry with its lines.
async fn get_entry(State(state): State<AppState>, Path(transaction_id): Path<Uuid>) -> Response {
    match state.engine.transaction(TransactionId::from(transaction_id)).await {
        Ok(transaction) => (StatusCode::OK, Json(transaction)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to get journal entry"),
    }
}

/// POST `/journal-entries/{transaction_id}/reverse` - Reverse an entry.
async fn reverse_entry(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<ReverseRequest>,
) -> Response {
    let id = TransactionId::from(transaction_id);
    let entry_date = payload.entry_date.unwrap_or_else(today);
    let result = retry_once("reverse_entry", || {
        state.engine.reverse(id, &payload.reason, entry_date)
    })
    .await;

    match result {
        Ok(reversal) => {
            info!(
                original = %id,
                reversal = %reversal.id,
                entry_number = %reversal.entry_number,
                "Journal entry reversed"
            );
            (StatusCode::CREATED, Json(reversal)).into_response()
        }
        Err(e) => ledger_error_response(&e, "Failed to reverse journal entry"),
    }
}
