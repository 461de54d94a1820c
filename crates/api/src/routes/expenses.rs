//! Expense routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::recorder::NewExpense;
use tally_shared::types::{ExpenseId, PageRequest, PageResponse};
use tracing::info;

use super::today;
use crate::AppState;
use crate::error::ledger_error_response;
use crate::retry::retry_once;

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/bulk-delete", post(bulk_delete_expenses))
}

/// Query parameters for listing expenses.
#[derive(Debug, Deserialize)]
pub struct ListExpensesQuery {
    /// Include deleted expenses.
    #[serde(default)]
    pub include_deleted: bool,
}

/// Request body for bulk deletion.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    /// Expenses to delete.
    pub expense_ids: Vec<ExpenseId>,
    /// Date of the reversing entries. Defaults to today.
    #[serde(default)]
    pub reversal_date: Option<NaiveDate>,
}

/// POST `/expenses` - Record an expense.
async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<NewExpense>,
) -> Response {
    match retry_once("create_expense", || state.recorder.record_expense(payload.clone())).await {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to record expense"),
    }
}

/// GET `/expenses` - List expenses, newest first.
async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ListExpensesQuery>,
    Query(page): Query<PageRequest>,
) -> Response {
    match state.recorder.expenses(query.include_deleted).await {
        Ok(expenses) => (StatusCode::OK, Json(PageResponse::from_vec(expenses, page))).into_response(),
        Err(e) => ledger_error_response(&e, "Failed to list expenses"),
    }
}

/// POST `/expenses/bulk-delete` - Delete expenses by reversing their postings.
///
/// Expenses that cannot be deleted are reported alongside the ones that were.
async fn bulk_delete_expenses(
    State(state): State<AppState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Response {
    let date = payload.reversal_date.unwrap_or_else(today);
    match state.recorder.delete_expenses(&payload.expense_ids, date).await {
        Ok(outcome) => {
            info!(
                deleted = outcome.deleted.len(),
                failed = outcome.failed.len(),
                "Bulk expense deletion finished"
            );
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => ledger_error_response(&e, "Bulk expense deletion aborted"),
    }
}
