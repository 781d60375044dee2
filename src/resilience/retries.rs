//! Retry loop.
//!
//! # Design Decisions
//! - First success short-circuits
//! - Stops after `max_retries` extra attempts; the last failure is surfaced
//! - No policy (or `max_retries = 0`) means exactly one attempt

use std::fmt::Display;
use std::future::Future;

use crate::resilience::backoff::RetryPolicy;

/// Run `operation` until it succeeds or the policy's retries are spent.
///
/// The closure receives the zero-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: Option<&RetryPolicy>, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_retries = policy.map_or(0, |p| p.max_retries);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                let delay = policy.map(|p| p.delay_for_attempt(attempt)).unwrap_or_default();
                tracing::info!(attempt, delay = ?delay, error = %e, "Retrying after failure");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success_with_growing_delays() {
        let policy = RetryPolicy::new(2, Duration::from_millis(100), 2.0);
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let mut attempt_times = Vec::new();

        let result: Result<&str, String> = retry_with_backoff(Some(&policy), |_| {
            attempt_times.push(start.elapsed());
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(format!("failure {}", n))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(attempt_times[1] - attempt_times[0], Duration::from_millis(100));
        assert_eq!(attempt_times[2] - attempt_times[1], Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_surfaces_last_failure() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10), 2.0);
        let result: Result<(), String> =
            retry_with_backoff(Some(&policy), |attempt| async move { Err(format!("attempt {}", attempt)) }).await;

        assert_eq!(result.unwrap_err(), "attempt 2");
    }

    #[tokio::test]
    async fn test_no_policy_means_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_with_backoff(None, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("boom") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let zero = RetryPolicy::new(0, Duration::from_millis(10), 2.0);
        let _ = retry_with_backoff(Some(&zero), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("boom") }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
