//! Retry with exponential back-off and jitter for outbound HTTP calls.
//!
//! Transient failures (429, 5xx, timeouts, connection errors) are retried;
//! everything else is returned on the first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::SocialError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &SocialError) -> bool {
    match err {
        SocialError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SocialError::RateLimited { .. } => true,
        SocialError::UnexpectedStatus { status, .. } => *status >= 500,
        SocialError::NotFound { .. }
        | SocialError::ApiError(_)
        | SocialError::Deserialize { .. }
        | SocialError::InvalidBaseUrl { .. } => false,
    }
}

/// Delay before retry number `attempt` (1-based), before jitter.
///
/// `backoff_base_ms × 2^(attempt-1)`, raised to any server-supplied
/// `Retry-After`, capped at 60 s.
pub(crate) fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32, err: &SocialError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let floor = match err {
        SocialError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1_000),
        _ => 0,
    };
    computed.max(floor).min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Each wait is [`backoff_delay_ms`] scaled by a ±25 % jitter.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SocialError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SocialError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = backoff_delay_ms(backoff_base_ms, attempt, &err);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient upstream error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
