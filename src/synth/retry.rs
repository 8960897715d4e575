//! Bounded exponential backoff for rate-limited backend calls.

use std::future::Future;

use tracing::warn;

use super::BackendError;
use crate::config::RetryPolicy;

/// Run `op` until it succeeds, fails with a non-rate-limit error, or the
/// policy's attempt cap is reached.
///
/// Attempt `n` (0-based) that is rate limited waits `base * 2^n` before the
/// next attempt. No wait follows the final attempt.
///
/// # Errors
///
/// Returns the first non-rate-limit error, or the last rate-limit error once
/// attempts are exhausted.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_rate_limited() && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = label,
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "backend rate limited; backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
