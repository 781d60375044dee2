//! Live health checking.
//!
//! # Responsibilities
//! - Probe `endpoint.health_check_path` with a bodyless GET
//! - Bound the probe by the endpoint's timeout
//! - Classify failures as timeout, non-2xx status or network error

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderValue};

use crate::error::{EndpointUnhealthyError, HealthCause};
use crate::health::checker::HealthChecker;
use crate::http::transport::{OutboundRequest, Transport};
use crate::load_balancer::endpoint::Endpoint;
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;

#[derive(Debug, Clone)]
pub struct LiveHealthChecker {
    transport: Arc<dyn Transport>,
}

impl LiveHealthChecker {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn unhealthy(endpoint: &Endpoint, cause: HealthCause) -> EndpointUnhealthyError {
        EndpointUnhealthyError {
            endpoint: endpoint.url().clone(),
            cause,
        }
    }
}

#[async_trait]
impl HealthChecker for LiveHealthChecker {
    async fn check_health(&self, endpoint: &Endpoint) -> Result<(), EndpointUnhealthyError> {
        let url = endpoint
            .health_url()
            .map_err(|e| Self::unhealthy(endpoint, HealthCause::Network(e.to_string())))?;

        let mut probe = OutboundRequest::get(url);
        probe.headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("geo-balancer-health-check"),
        );

        let outcome = match with_deadline(endpoint.timeout(), self.transport.send(probe)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => {
                tracing::warn!(endpoint = %endpoint, status = %response.status(), "Health check failed: non-success status");
                Err(Self::unhealthy(endpoint, HealthCause::Status(response.status())))
            }
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Health check failed: connection error");
                Err(Self::unhealthy(endpoint, HealthCause::Network(e.to_string())))
            }
            Err(elapsed) => {
                tracing::warn!(endpoint = %endpoint, timeout = ?elapsed.0, "Health check failed: timeout");
                Err(Self::unhealthy(endpoint, HealthCause::Timeout(elapsed.0)))
            }
        };

        metrics::record_health_check(endpoint.origin(), outcome.is_ok());
        outcome
    }
}
