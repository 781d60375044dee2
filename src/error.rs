//! Error taxonomy for the balancer.
//!
//! Per-endpoint errors (`RequestForwardError`, `EndpointUnhealthyError`) are
//! absorbed by the availability strategies, which move on to the next
//! candidate. Only `NoHealthyEndpointsError` escalates out of a strategy run.

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::load_balancer::endpoint::TriedEndpoint;

/// Why a single forward attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardCause {
    /// Connection refused, reset, DNS failure, aborted transfer.
    #[error("network error: {0}")]
    Network(String),

    /// The per-attempt deadline elapsed before response headers arrived.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The inbound body could not be read into memory.
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    /// The rewritten target URL was not valid.
    #[error("invalid target url: {0}")]
    InvalidTarget(String),
}

/// Transport failure on one endpoint attempt.
///
/// `endpoint` is `None` only when buffering the inbound body failed, before
/// any endpoint was contacted.
#[derive(Debug, Clone, Error)]
#[error("forward to {} failed: {cause}", forward_target(.endpoint))]
pub struct RequestForwardError {
    pub endpoint: Option<Url>,
    pub cause: ForwardCause,
}

impl RequestForwardError {
    pub fn new(endpoint: &Url, cause: ForwardCause) -> Self {
        Self {
            endpoint: Some(endpoint.clone()),
            cause,
        }
    }

    pub fn body_read(message: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            cause: ForwardCause::BodyRead(message.into()),
        }
    }
}

fn forward_target(endpoint: &Option<Url>) -> &str {
    endpoint.as_ref().map_or("<inbound request>", Url::as_str)
}

/// Why a health probe failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthCause {
    #[error("health check timed out after {0:?}")]
    Timeout(Duration),

    #[error("health check returned {0}")]
    Status(StatusCode),

    #[error("health check network error: {0}")]
    Network(String),
}

/// One health check failed. Never fatal on its own.
#[derive(Debug, Clone, Error)]
#[error("endpoint {endpoint} is unhealthy: {cause}")]
pub struct EndpointUnhealthyError {
    pub endpoint: Url,
    pub cause: HealthCause,
}

/// Every candidate endpoint was exhausted.
#[derive(Debug, Clone, Error)]
#[error("no healthy endpoints ({} tried)", .tried_endpoints.len())]
pub struct NoHealthyEndpointsError {
    pub tried_endpoints: Vec<TriedEndpoint>,
}

/// Raised by a circuit breaker guarding an endpoint.
///
/// Nothing in the balancer trips a circuit yet; the type exists so callers
/// can match on it once one does.
#[derive(Debug, Clone, Error)]
#[error("circuit open for endpoint {endpoint}")]
pub struct CircuitOpenError {
    pub endpoint: Url,
}

/// Errors surfaced by [`LoadBalancer::handle_request`](crate::LoadBalancer::handle_request).
#[derive(Debug, Error)]
pub enum BalancerError {
    #[error(transparent)]
    Forward(#[from] RequestForwardError),

    #[error(transparent)]
    NoHealthyEndpoints(#[from] NoHealthyEndpointsError),

    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),
}

/// Result type for balancer operations.
pub type BalancerResult<T> = Result<T, BalancerError>;

/// Errors assembling a balancer from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid endpoint url '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid recovery response: {0}")]
    InvalidRecovery(String),

    #[error("failed to build HTTP client: {0}")]
    Transport(#[from] reqwest::Error),
}
