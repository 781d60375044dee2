//! Fail-forward: try endpoints in order until one answers acceptably.

use std::collections::BTreeSet;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;

use crate::availability::{AvailabilityStrategy, Served, StrategyContext};
use crate::error::{NoHealthyEndpointsError, RequestForwardError};
use crate::http::request::BufferedRequest;
use crate::load_balancer::endpoint::{Endpoint, FailureReason, TriedEndpoint};
use crate::observability::metrics;

/// Statuses that trigger failover when none are configured.
pub const DEFAULT_FAILOVER_STATUSES: [u16; 3] = [502, 503, 504];

/// Sequential failover driven by transport errors and response status.
#[derive(Debug, Clone)]
pub struct FailForward {
    failover_on_statuses: BTreeSet<u16>,
}

impl Default for FailForward {
    fn default() -> Self {
        Self::new(DEFAULT_FAILOVER_STATUSES)
    }
}

impl FailForward {
    pub fn new(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            failover_on_statuses: statuses.into_iter().collect(),
        }
    }

    /// Split an attempt outcome into an acceptable response or a failover reason.
    pub fn classify(
        &self,
        outcome: Result<Response<Body>, RequestForwardError>,
    ) -> Result<Response<Body>, FailureReason> {
        match outcome {
            Err(e) => Err(FailureReason::Forward(e.cause)),
            Ok(response) if self.failover_on_statuses.contains(&response.status().as_u16()) => {
                Err(FailureReason::Status(response.status()))
            }
            Ok(response) => Ok(response),
        }
    }
}

#[async_trait]
impl AvailabilityStrategy for FailForward {
    fn name(&self) -> &'static str {
        "fail_forward"
    }

    async fn execute(
        &self,
        ordering: &[Endpoint],
        request: &BufferedRequest,
        ctx: StrategyContext<'_>,
    ) -> Result<Served, NoHealthyEndpointsError> {
        let mut tried = Vec::new();

        for endpoint in ordering {
            let outcome = ctx
                .forwarder
                .forward_with_retry(endpoint, request, ctx.retry_policy)
                .await;

            match self.classify(outcome) {
                Ok(response) => {
                    return Ok(Served {
                        response,
                        endpoint: endpoint.clone(),
                        tried,
                    });
                }
                Err(reason) => {
                    tracing::warn!(
                        request_id = %request.request_id(),
                        endpoint = %endpoint,
                        reason = %reason,
                        "Failing over to next endpoint"
                    );
                    metrics::record_failover(endpoint.origin(), reason.label());
                    tried.push(TriedEndpoint::new(endpoint.clone(), reason));
                }
            }
        }

        Err(NoHealthyEndpointsError { tried_endpoints: tried })
    }
}
