//! JSON error responses.
//!
//! Every failure leaves the API as `{"error": "<CODE>", "message": "..."}`
//! with the status the error type assigns.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::ledger::LedgerError;
use tally_core::reports::ExportError;
use tally_shared::AppError;
use tracing::{error, warn};

/// Builds an error response.
pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Maps a ledger error to its response, logging server-side failures.
pub fn ledger_error_response(err: &LedgerError, context: &str) -> Response {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, code = err.error_code(), "{context}");
    } else {
        warn!(error = %err, code = err.error_code(), "{context}");
    }
    json_error(status, err.error_code(), err.to_string())
}

/// Maps an application error to its response.
pub fn app_error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    }
    json_error(status, err.error_code(), err.to_string())
}

/// Maps a report export failure.
pub fn export_error_response(err: &ExportError) -> Response {
    app_error_response(&AppError::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tally_shared::types::AccountId;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ledger_error_body_carries_code_and_message() {
        let id = AccountId::new();
        let response = ledger_error_response(&LedgerError::AccountNotFound(id), "lookup");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "ACCOUNT_NOT_FOUND");
        assert_eq!(body["message"], format!("Account not found: {id}"));
    }

    #[tokio::test]
    async fn test_app_error_uses_its_status() {
        let response = app_error_response(&AppError::Validation("bad year".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
    }
}
