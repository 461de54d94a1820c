//! Errors raised outside the ledger rules.
//!
//! Ledger rule violations are `LedgerError` in `tally-core`. What is left is
//! bad request input the handlers parse themselves and failures that are
//! never the caller's fault, such as an export that cannot be encoded.

use thiserror::Error;

/// Request or server failure with no ledger meaning.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input the handler could not accept.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Server-side failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for the response.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Machine-readable code, shared with `LedgerError` codes in responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
