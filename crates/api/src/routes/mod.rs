//! API route definitions.

use axum::Router;
use chrono::{NaiveDate, Utc};

use crate::AppState;

pub mod accounts;
pub mod billing;
pub mod expenses;
pub mod health;
pub mod journal;
pub mod payments;
pub mod reports;
pub mod transfers;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(journal::routes())
        .merge(transfers::routes())
        .merge(payments::routes())
        .merge(expenses::routes())
        .merge(billing::routes())
        .merge(reports::routes())
}

/// Today's date in UTC, the default for `as_of` parameters.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
