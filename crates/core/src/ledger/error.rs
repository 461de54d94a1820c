//! Ledger error types.
//!
//! One taxonomy covers posting validation, account and transaction lookups,
//! storage conflicts, and the payment gateway, so every service in this crate
//! returns `Result<_, LedgerError>`.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ExpenseId, TransactionId};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Why a posting line's account was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidAccountReason {
    /// No account with that ID.
    NotFound,
    /// The account is deactivated.
    Inactive,
}

impl fmt::Display for InvalidAccountReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transaction must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Debits and credits differ.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debits.
        debit: Decimal,
        /// Total credits.
        credit: Decimal,
    },

    /// Line amount is zero or negative.
    #[error("Line amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Line amount has digits beyond the cent.
    #[error("Line amount {0} has more than 2 decimal places")]
    SubCentAmount(Decimal),

    /// Amount, or a sum of amounts, exceeds what the ledger can store.
    #[error("Amount {0} exceeds the largest storable amount")]
    AmountOutOfRange(Decimal),

    /// A line references a missing or inactive account.
    #[error("Account {account_id} cannot be posted to: {reason}")]
    InvalidAccount {
        /// Offending account.
        account_id: AccountId,
        /// Why it was refused.
        reason: InvalidAccountReason,
    },

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer from an account to itself")]
    SameAccountTransfer,

    /// Unknown account type name.
    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    /// Parent account missing or of another class.
    #[error("Invalid parent account: {0}")]
    InvalidParentAccount(String),

    /// `from` is after `to`.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange {
        /// Range start.
        from: NaiveDate,
        /// Range end.
        to: NaiveDate,
    },

    /// Other input error.
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Another account already has this name.
    #[error("An account named '{0}' already exists")]
    DuplicateAccountName(String),

    /// Account type cannot change after postings exist.
    #[error("Cannot change account type for account {0} because it has postings")]
    AccountTypeChangeNotAllowed(AccountId),

    // ========== Transaction Errors ==========
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// A reversal already exists for the transaction.
    #[error("Transaction {0} has already been reversed")]
    AlreadyReversed(TransactionId),

    /// Reversals cannot themselves be reversed.
    #[error("Transaction {0} is a reversal and cannot be reversed")]
    CannotReverseReversal(TransactionId),

    /// Expense not found.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    /// Expense was already deleted.
    #[error("Expense {0} has already been deleted")]
    ExpenseAlreadyDeleted(ExpenseId),

    // ========== Concurrency Errors ==========
    /// Conflicting concurrent write; safe to retry.
    #[error("Concurrent modification detected, please retry: {0}")]
    ConcurrencyConflict(String),

    // ========== Payment Gateway Errors ==========
    /// No gateway is configured for card payments.
    #[error("Card payments are not available: no payment gateway configured")]
    GatewayNotConfigured,

    /// Gateway refused or failed the capture.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Posting failed after a capture and the refund failed too.
    #[error("Posting failed ({posting_error}) and refund of capture {capture_reference} failed ({refund_error})")]
    CompensationFailed {
        /// Gateway reference of the orphaned capture.
        capture_reference: String,
        /// Original posting failure.
        posting_error: String,
        /// Refund failure.
        refund_error: String,
    },

    // ========== Storage Errors ==========
    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::SubCentAmount(_) => "SUB_CENT_AMOUNT",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::InvalidAccount { .. } => "INVALID_ACCOUNT",
            Self::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            Self::InvalidAccountType(_) => "INVALID_ACCOUNT_TYPE",
            Self::InvalidParentAccount(_) => "INVALID_PARENT_ACCOUNT",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::DuplicateAccountName(_) => "DUPLICATE_ACCOUNT_NAME",
            Self::AccountTypeChangeNotAllowed(_) => "ACCOUNT_TYPE_CHANGE_NOT_ALLOWED",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::CannotReverseReversal(_) => "CANNOT_REVERSE_REVERSAL",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::ExpenseAlreadyDeleted(_) => "EXPENSE_ALREADY_DELETED",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::GatewayNotConfigured => "GATEWAY_NOT_CONFIGURED",
            Self::Gateway(_) => "PAYMENT_GATEWAY_ERROR",
            Self::CompensationFailed { .. } => "COMPENSATION_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InsufficientLines
            | Self::UnbalancedEntry { .. }
            | Self::NonPositiveAmount(_)
            | Self::SubCentAmount(_)
            | Self::AmountOutOfRange(_)
            | Self::InvalidAccount { .. }
            | Self::SameAccountTransfer
            | Self::InvalidAccountType(_)
            | Self::InvalidParentAccount(_)
            | Self::InvalidDateRange { .. }
            | Self::Validation(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::TransactionNotFound(_) | Self::ExpenseNotFound(_) => {
                404
            }

            // 409 Conflict
            Self::DuplicateAccountName(_) | Self::ConcurrencyConflict(_) => 409,

            // 422 Unprocessable - business rules
            Self::AccountTypeChangeNotAllowed(_)
            | Self::AlreadyReversed(_)
            | Self::CannotReverseReversal(_)
            | Self::ExpenseAlreadyDeleted(_) => 422,

            // 502 Bad Gateway - payment gateway
            Self::Gateway(_) | Self::CompensationFailed { .. } => 502,

            // 503 Service Unavailable
            Self::GatewayNotConfigured => 503,

            // 500 Internal Server Error
            Self::Storage(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}
