//! Per-attempt deadline enforcement.
//!
//! Dropping the timed-out future cancels the underlying network operation.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time;

/// The operation did not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run `future` with a deadline.
pub async fn with_deadline<F>(deadline: Duration, future: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    time::timeout(deadline, future)
        .await
        .map_err(|_| DeadlineExceeded(deadline))
}
