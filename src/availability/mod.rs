//! Availability strategies.
//!
//! # Data Flow
//! ```text
//! Endpoint ordering (from steering) + buffered request
//!     → Apply availability strategy:
//!         - fail_forward.rs (sequential, response-status driven failover)
//!         - async_block.rs (sequential, health-gated)
//!         - promise_any.rs (parallel health race, forward to the winner)
//!     → Served { response, endpoint, tried } or NoHealthyEndpointsError
//! ```
//!
//! # Design Decisions
//! - Strategies are stateless; everything per-request lives on the stack
//! - Per-endpoint failures are absorbed here; only exhaustion escalates
//! - Application-level responses (4xx, unlisted 5xx) are never reinterpreted

pub mod async_block;
pub mod fail_forward;
pub mod promise_any;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;

use crate::config::{AvailabilityConfig, AvailabilityMode};
use crate::error::NoHealthyEndpointsError;
use crate::health::HealthChecker;
use crate::http::forwarder::RequestForwarder;
use crate::http::request::BufferedRequest;
use crate::load_balancer::endpoint::{Endpoint, TriedEndpoint};
use crate::resilience::backoff::RetryPolicy;

pub use async_block::AsyncBlock;
pub use fail_forward::{FailForward, DEFAULT_FAILOVER_STATUSES};
pub use promise_any::PromiseAny;

/// Collaborators a strategy run may use.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub forwarder: &'a RequestForwarder,
    pub health: &'a Arc<dyn HealthChecker>,
    pub retry_policy: Option<&'a RetryPolicy>,
}

/// Successful outcome of a strategy run.
#[derive(Debug)]
pub struct Served {
    pub response: Response<Body>,
    /// Endpoint that produced `response`.
    pub endpoint: Endpoint,
    /// Endpoints abandoned before `endpoint` succeeded.
    pub tried: Vec<TriedEndpoint>,
}

/// Walks an endpoint ordering to produce one response.
#[async_trait]
pub trait AvailabilityStrategy: Send + Sync + std::fmt::Debug {
    /// Name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        ordering: &[Endpoint],
        request: &BufferedRequest,
        ctx: StrategyContext<'_>,
    ) -> Result<Served, NoHealthyEndpointsError>;
}

/// Build the strategy named by the configuration.
pub fn from_config(config: &AvailabilityConfig) -> Arc<dyn AvailabilityStrategy> {
    match config.mode {
        AvailabilityMode::FailForward => Arc::new(FailForward::new(config.failover_on_statuses.iter().copied())),
        AvailabilityMode::AsyncBlock => Arc::new(AsyncBlock),
        AvailabilityMode::PromiseAny => Arc::new(PromiseAny),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_selects_strategy() {
        let mut config = AvailabilityConfig::default();
        assert_eq!(from_config(&config).name(), "fail_forward");

        config.mode = AvailabilityMode::AsyncBlock;
        assert_eq!(from_config(&config).name(), "async_block");

        config.mode = AvailabilityMode::PromiseAny;
        assert_eq!(from_config(&config).name(), "promise_any");
    }
}
