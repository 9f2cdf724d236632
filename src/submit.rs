use crate::config::SubmitPolicy;
use crate::errors::{AppError, AppResult};
use crate::models::SubmitResponse;
use crate::mutation::Transaction;
use crate::store::DocumentStore;
use std::time::Duration;

const MIN_BACKOFF_MS: u64 = 100;

/// Submits `transaction` and turns a store-reported error into
/// `AppError::Remote`. Transport failures are retried under `policy` only
/// when the transaction is retry safe; anything that creates records or
/// appends to a child list gets exactly one attempt.
pub async fn submit_transaction(
    store: &dyn DocumentStore,
    transaction: &Transaction,
    policy: &SubmitPolicy,
) -> AppResult<SubmitResponse> {
    let max_attempts = if transaction.is_retry_safe() {
        policy.max_attempts.max(1)
    } else {
        1
    };

    let mut attempt = 1u32;
    loop {
        match store.submit_transaction(transaction.operations()).await {
            Ok(response) => return into_result(response),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay_ms = backoff_ms(policy.retry_backoff_ms, attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %error,
                    "transaction submit failed; retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

fn into_result(response: SubmitResponse) -> AppResult<SubmitResponse> {
    match response.error {
        Some(error) => {
            tracing::warn!(message = %error.message, "store rejected transaction");
            Err(AppError::Remote(error.message))
        }
        None => Ok(response),
    }
}

fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1);
    let multiplier: u64 = 1_u64.checked_shl(shift).unwrap_or(u64::MAX);
    base_ms.saturating_mul(multiplier).max(MIN_BACKOFF_MS)
}
