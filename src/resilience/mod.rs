//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward attempt to an endpoint:
//!     → timeouts.rs (per-attempt deadline = endpoint timeout)
//!     → On transport failure: retries.rs (retry with backoff.rs delays)
//!     → Exhausted: failure surfaces to the availability strategy
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every network call has a deadline
//! - Retries only wrap transport failures, never HTTP responses
//! - No retry unless a policy is configured
//! - A circuit breaker is not part of this layer yet (`CircuitOpenError` is reserved)

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::RetryPolicy;
pub use retries::retry_with_backoff;
pub use timeouts::{with_deadline, DeadlineExceeded};
