//! Single retry of mutations that lost a storage race.

use std::future::Future;

use tally_core::ledger::LedgerError;
use tracing::warn;

/// Runs `operation`, and once more if the first attempt failed with a
/// retryable error. The second outcome is returned as is.
pub async fn retry_once<T, F, Fut>(name: &'static str, mut operation: F) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    match operation().await {
        Err(err) if err.is_retryable() => {
            warn!(operation = name, error = %err, "Retrying after concurrency conflict");
            operation().await
        }
        result => result,
    }
}
