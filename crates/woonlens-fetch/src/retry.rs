//! Retry with exponential doubling, implemented once for every adapter.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::SourceError;

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors, sleeping `initial_delay` before the first retry and doubling the
/// delay after each sleep.
///
/// The deadline is checked before every attempt and before every sleep; once
/// it has passed the call aborts immediately with [`SourceError::Cancelled`].
/// Non-retriable errors are returned as-is without sleeping.
///
/// # Errors
///
/// The last attempt's error, or [`SourceError::Cancelled`] on deadline expiry.
pub async fn with_retry<T, F, Fut>(
    deadline: Instant,
    max_retries: u32,
    initial_delay: Duration,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut delay = initial_delay;
    let mut attempt = 0u32;
    loop {
        if Instant::now() >= deadline {
            return Err(SourceError::Cancelled);
        }
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                if Instant::now() >= deadline {
                    return Err(SourceError::Cancelled);
                }
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient upstream error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}
