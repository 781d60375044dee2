//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → balancer.rs (LoadBalancer::handle_request)
//!         → routing::Steering (endpoint ordering)
//!         → availability strategy walks the ordering
//!         → endpoint.rs (Endpoint, TriedEndpoint, FailureReason)
//!     → on exhaustion: recovery.rs (RecoveryHandler, at most once)
//!     → Response or BalancerError
//! ```
//!
//! # Design Decisions
//! - The balancer is immutable after build; reload swaps a whole new one
//! - Endpoint selection state lives on the request's stack, never shared
//! - `weight` is carried on Endpoint but no selection reads it

pub mod balancer;
pub mod endpoint;
pub mod recovery;

pub use balancer::{LoadBalancer, LoadBalancerBuilder};
pub use endpoint::{Endpoint, FailureReason, GeoConfig, GeoEndpoint, RecoveryContext, TriedEndpoint};
pub use recovery::{recovery_fn, FnRecovery, RecoveryHandler, StaticRecovery};
