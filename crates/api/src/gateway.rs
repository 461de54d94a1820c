//! HTTP client for the card payment gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::gateway::{Capture, CaptureRequest, GatewayError, PaymentGateway};
use tally_core::ledger::LedgerError;
use tally_shared::config::GatewayConfig;
use tracing::info;

#[derive(Debug, Serialize)]
struct CaptureBody<'a> {
    amount: Decimal,
    currency: &'a str,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    id: String,
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct RefundBody {
    amount: Decimal,
}

/// Gateway reached over HTTPS with a bearer API key.
///
/// `POST {base_url}/captures` charges, `POST {base_url}/captures/{id}/refunds`
/// refunds. The payment ID doubles as the idempotency key.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    /// Creates a client from configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Protocol(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Classifies a non-success gateway status.
fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let detail = format!("{status}: {body}");
    match status {
        StatusCode::PAYMENT_REQUIRED | StatusCode::UNPROCESSABLE_ENTITY => {
            GatewayError::Declined(detail)
        }
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            GatewayError::Unavailable(detail)
        }
        _ => GatewayError::Protocol(detail),
    }
}

fn transport_error(err: &reqwest::Error) -> GatewayError {
    GatewayError::Unavailable(err.to_string())
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn capture(&self, request: &CaptureRequest) -> Result<Capture, LedgerError> {
        let response = self
            .client
            .post(format!("{}/captures", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", &request.reference)
            .json(&CaptureBody {
                amount: request.amount,
                currency: &request.currency,
                reference: &request.reference,
                description: request.description.as_deref(),
            })
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }

        let captured: CaptureResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(format!("invalid capture response: {e}")))?;
        if captured.amount != request.amount {
            return Err(GatewayError::Protocol(format!(
                "captured {} but requested {}",
                captured.amount, request.amount
            ))
            .into());
        }

        info!(
            reference = %request.reference,
            capture = %captured.id,
            amount = %captured.amount,
            "Card payment captured"
        );
        Ok(Capture {
            reference: captured.id,
            amount: captured.amount,
        })
    }

    async fn refund(&self, capture: &Capture) -> Result<(), LedgerError> {
        let response = self
            .client
            .post(format!("{}/captures/{}/refunds", self.base_url, capture.reference))
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", format!("refund-{}", capture.reference))
            .json(&RefundBody {
                amount: capture.amount,
            })
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }

        info!(capture = %capture.reference, amount = %capture.amount, "Card payment refunded");
        Ok(())
    }
}
