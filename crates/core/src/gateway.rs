//! Payment gateway seam for card payments.
//!
//! A card payment is captured at the gateway before its posting is committed.
//! If the commit then fails, the capture is refunded so money never moves
//! without a matching journal entry.

use std::future::Future;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::ledger::LedgerError;

/// Errors reported by a payment gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway refused the charge.
    #[error("payment declined: {0}")]
    Declined(String),

    /// The gateway could not be reached or timed out.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway answered with something unexpected.
    #[error("payment gateway protocol error: {0}")]
    Protocol(String),
}

/// A charge to capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Amount to charge.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Idempotency reference, the payment ID.
    pub reference: String,
    /// Statement description.
    pub description: Option<String>,
}

/// A successful capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Gateway-assigned reference.
    pub reference: String,
    /// Amount captured.
    pub amount: Decimal,
}

/// External card processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the card.
    async fn capture(&self, request: &CaptureRequest) -> Result<Capture, LedgerError>;

    /// Refunds a capture in full.
    async fn refund(&self, capture: &Capture) -> Result<(), LedgerError>;
}

/// Gateway used when none is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn capture(&self, _request: &CaptureRequest) -> Result<Capture, LedgerError> {
        Err(LedgerError::GatewayNotConfigured)
    }

    async fn refund(&self, _capture: &Capture) -> Result<(), LedgerError> {
        Err(LedgerError::GatewayNotConfigured)
    }
}

/// Runs `commit` after a capture, refunding the capture if it fails.
///
/// Returns the commit's own error when the refund succeeds, and
/// `CompensationFailed` when it does not.
pub async fn commit_or_compensate<T, F>(
    gateway: &dyn PaymentGateway,
    capture: &Capture,
    commit: F,
) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>> + Send,
{
    let posting_error = match commit.await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    warn!(
        capture_reference = %capture.reference,
        error = %posting_error,
        "Posting failed after capture, refunding"
    );

    match gateway.refund(capture).await {
        Ok(()) => Err(posting_error),
        Err(refund_error) => {
            error!(
                capture_reference = %capture.reference,
                amount = %capture.amount,
                posting_error = %posting_error,
                refund_error = %refund_error,
                "Refund failed; capture has no journal entry"
            );
            Err(LedgerError::CompensationFailed {
                capture_reference: capture.reference.clone(),
                posting_error: posting_error.to_string(),
                refund_error: refund_error.to_string(),
            })
        }
    }
}
