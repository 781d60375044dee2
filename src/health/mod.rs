//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Availability strategy (async-block / promise-any):
//!     → checker.rs (HealthChecker capability)
//!         - active.rs: LiveHealthChecker probes endpoint.health_check_path
//!         - checker.rs: AlwaysHealthy for deterministic tests
//!     → Ok(()) admits the endpoint, EndpointUnhealthyError skips it
//! ```
//!
//! # Design Decisions
//! - Strategies only see the trait object, never a concrete checker
//! - Probes are on-demand per request; no background state is kept
//! - Every probe is bounded by the endpoint's timeout

pub mod active;
pub mod checker;

pub use active::LiveHealthChecker;
pub use checker::{AlwaysHealthy, HealthChecker};
