//! Report and chart routes.
//!
//! Every report is served as JSON by default; `?format=csv` returns the same
//! snapshot as a CSV attachment.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tally_core::reports::{ExportError, ExportFormat, export};
use tally_shared::AppError;

use super::today;
use crate::AppState;
use crate::error::{app_error_response, export_error_response, ledger_error_response};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/balance-sheet", get(balance_sheet))
        .route("/reports/profit-and-loss", get(profit_and_loss))
        .route("/reports/trial-balance", get(trial_balance))
        .route("/charts/monthly-balance-sheet", get(monthly_balance_sheet))
        .route("/charts/monthly-profit-and-loss", get(monthly_profit_and_loss))
}

/// Query parameters for point-in-time reports.
#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    /// Report date. Defaults to today.
    pub as_of: Option<NaiveDate>,
    /// `json` or `csv`.
    pub format: Option<String>,
}

/// Query parameters for the profit and loss report.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// First day of the period. Defaults to January 1 of the end date's year.
    pub from: Option<NaiveDate>,
    /// Last day of the period. Defaults to today.
    pub to: Option<NaiveDate>,
    /// `json` or `csv`.
    pub format: Option<String>,
}

/// Query parameters for the monthly charts.
#[derive(Debug, Deserialize)]
pub struct YearQuery {
    /// Calendar year. Defaults to the current year.
    pub year: Option<i32>,
    /// `json` or `csv`.
    pub format: Option<String>,
}

/// JSON unless `?format=` asks otherwise.
fn parse_format(raw: Option<&str>) -> Result<ExportFormat, AppError> {
    raw.map_or(Ok(ExportFormat::default()), |raw| {
        raw.parse()
            .map_err(|e: ExportError| AppError::Validation(e.to_string()))
    })
}

fn render<T, F>(report: &T, format: ExportFormat, filename: &str, write_csv: F) -> Response
where
    T: Serialize,
    F: FnOnce(&T, &mut Vec<u8>) -> Result<(), ExportError>,
{
    match format {
        ExportFormat::Json => (StatusCode::OK, Json(report)).into_response(),
        ExportFormat::Csv => match export::csv_string(|out| write_csv(report, out)) {
            Ok(body) => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}.csv\""),
                    ),
                ],
                body,
            )
                .into_response(),
            Err(e) => export_error_response(&e),
        },
    }
}

/// GET `/reports/balance-sheet`
async fn balance_sheet(State(state): State<AppState>, Query(query): Query<AsOfQuery>) -> Response {
    let format = match parse_format(query.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return app_error_response(&e),
    };
    let as_of = query.as_of.unwrap_or_else(today);

    match state.reports.balance_sheet(as_of).await {
        Ok(report) => render(&report, format, &format!("balance-sheet-{as_of}"), |r, out| {
            export::balance_sheet_csv(r, out)
        }),
        Err(e) => ledger_error_response(&e, "Failed to build balance sheet"),
    }
}

/// GET `/reports/profit-and-loss`
async fn profit_and_loss(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let format = match parse_format(query.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return app_error_response(&e),
    };
    let to = query.to.unwrap_or_else(today);
    let from = match query.from {
        Some(from) => from,
        None => match NaiveDate::from_ymd_opt(to.year(), 1, 1) {
            Some(start) => start,
            None => {
                return app_error_response(&AppError::Validation(format!(
                    "no start of year for {to}"
                )));
            }
        },
    };

    match state.reports.profit_and_loss(from, to).await {
        Ok(report) => render(&report, format, &format!("profit-and-loss-{from}-{to}"), |r, out| {
            export::profit_and_loss_csv(r, out)
        }),
        Err(e) => ledger_error_response(&e, "Failed to build profit and loss"),
    }
}

/// GET `/reports/trial-balance`
async fn trial_balance(State(state): State<AppState>, Query(query): Query<AsOfQuery>) -> Response {
    let format = match parse_format(query.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return app_error_response(&e),
    };
    let as_of = query.as_of.unwrap_or_else(today);

    match state.reports.trial_balance(as_of).await {
        Ok(report) => render(&report, format, &format!("trial-balance-{as_of}"), |r, out| {
            export::trial_balance_csv(r, out)
        }),
        Err(e) => ledger_error_response(&e, "Failed to build trial balance"),
    }
}

/// GET `/charts/monthly-balance-sheet` - Month-end totals for a year.
async fn monthly_balance_sheet(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Response {
    let format = match parse_format(query.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return app_error_response(&e),
    };
    let year = query.year.unwrap_or_else(|| today().year());

    match state.reports.monthly_balance_sheet(year).await {
        Ok(report) => render(&report, format, &format!("monthly-balance-sheet-{year}"), |r, out| {
            export::monthly_balance_sheet_csv(r, out)
        }),
        Err(e) => ledger_error_response(&e, "Failed to build monthly balance sheet"),
    }
}

/// GET `/charts/monthly-profit-and-loss` - Income and expenses per month.
async fn monthly_profit_and_loss(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Response {
    let format = match parse_format(query.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return app_error_response(&e),
    };
    let year = query.year.unwrap_or_else(|| today().year());

    match state.reports.monthly_profit_and_loss(year).await {
        Ok(report) => render(
            &report,
            format,
            &format!("monthly-profit-and-loss-{year}"),
            |r, out| export::monthly_profit_and_loss_csv(r, out),
        ),
        Err(e) => ledger_error_response(&e, "Failed to build monthly profit and loss"),
    }
}
