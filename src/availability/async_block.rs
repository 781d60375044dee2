//! Async-block: health-gate each endpoint in order, forward to the first
//! healthy one.

use async_trait::async_trait;

use crate::availability::{AvailabilityStrategy, Served, StrategyContext};
use crate::error::NoHealthyEndpointsError;
use crate::http::request::BufferedRequest;
use crate::load_balancer::endpoint::{Endpoint, FailureReason, TriedEndpoint};
use crate::observability::metrics;

/// Sequential, health-gated strategy.
///
/// The health check is the only admission gate: once an endpoint is admitted,
/// whatever it answers is returned. A forward failure on an admitted endpoint
/// is recorded and the walk continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncBlock;

#[async_trait]
impl AvailabilityStrategy for AsyncBlock {
    fn name(&self) -> &'static str {
        "async_block"
    }

    async fn execute(
        &self,
        ordering: &[Endpoint],
        request: &BufferedRequest,
        ctx: StrategyContext<'_>,
    ) -> Result<Served, NoHealthyEndpointsError> {
        let mut tried = Vec::new();

        for endpoint in ordering {
            if let Err(e) = ctx.health.check_health(endpoint).await {
                tracing::warn!(
                    request_id = %request.request_id(),
                    endpoint = %endpoint,
                    error = %e.cause,
                    "Skipping unhealthy endpoint"
                );
                let reason = FailureReason::Unhealthy(e.cause);
                metrics::record_failover(endpoint.origin(), reason.label());
                tried.push(TriedEndpoint::new(endpoint.clone(), reason));
                continue;
            }

            match ctx.forwarder.forward(endpoint, request).await {
                Ok(response) => {
                    return Ok(Served {
                        response,
                        endpoint: endpoint.clone(),
                        tried,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        request_id = %request.request_id(),
                        endpoint = %endpoint,
                        error = %e.cause,
                        "Forward to healthy endpoint failed"
                    );
                    let reason = FailureReason::Forward(e.cause);
                    metrics::record_failover(endpoint.origin(), reason.label());
                    tried.push(TriedEndpoint::new(endpoint.clone(), reason));
                }
            }
        }

        Err(NoHealthyEndpointsError { tried_endpoints: tried })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ForwardCause, HealthCause};
    use crate::health::HealthChecker;
    use crate::http::forwarder::RequestForwarder;
    use crate::testing::{endpoint, get_request, Reply, ScriptedHealth, ScriptedTransport};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;

    async fn run(
        transport: ScriptedTransport,
        health: ScriptedHealth,
        ordering: &[Endpoint],
    ) -> (Result<Served, NoHealthyEndpointsError>, Arc<ScriptedTransport>, Arc<ScriptedHealth>) {
        let transport = Arc::new(transport);
        let health = Arc::new(health);
        let forwarder = RequestForwarder::new(transport.clone());
        let checker: Arc<dyn HealthChecker> = health.clone();
        let request = forwarder.buffer_body(get_request("/status")).await.unwrap();

        let ctx = StrategyContext {
            forwarder: &forwarder,
            health: &checker,
            retry_policy: None,
        };
        let result = AsyncBlock.execute(ordering, &request, ctx).await;
        (result, transport, health)
    }

    #[tokio::test]
    async fn test_skips_unhealthy_and_forwards_to_first_healthy() {
        let ordering = vec![endpoint("http://e1.test"), endpoint("http://e2.test"), endpoint("http://e3.test")];
        let (result, transport, health) = run(
            ScriptedTransport::new()
                .script("http://e2.test", vec![Reply::Status(200, "e2")])
                .script("http://e3.test", vec![Reply::Status(200, "e3")]),
            ScriptedHealth::new().unhealthy("http://e1.test", Duration::ZERO),
            &ordering,
        )
        .await;

        let served = result.unwrap();
        assert_eq!(served.endpoint.origin(), "http://e2.test");
        assert_eq!(served.tried.len(), 1);
        assert!(matches!(
            served.tried[0].failure_reason,
            FailureReason::Unhealthy(HealthCause::Status(_))
        ));

        // e3 is never probed once e2 is admitted.
        assert_eq!(health.probes(), vec!["http://e1.test", "http://e2.test"]);
        assert!(transport.calls_to("http://e1.test").is_empty());
        assert!(transport.calls_to("http://e3.test").is_empty());
    }

    #[tokio::test]
    async fn test_admitted_endpoint_response_is_returned_even_if_5xx() {
        let ordering = vec![endpoint("http://e1.test"), endpoint("http://e2.test")];
        let (result, transport, _) = run(
            ScriptedTransport::new()
                .script("http://e1.test", vec![Reply::Status(503, "busy")])
                .script("http://e2.test", vec![Reply::Status(200, "e2")]),
            ScriptedHealth::new(),
            &ordering,
        )
        .await;

        let served = result.unwrap();
        assert_eq!(served.response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(served.tried.is_empty());
        assert!(transport.calls_to("http://e2.test").is_empty());
    }

    #[tokio::test]
    async fn test_forward_failure_on_healthy_endpoint_continues() {
        let ordering = vec![endpoint("http://e1.test"), endpoint("http://e2.test")];
        let (result, _, _) = run(
            ScriptedTransport::new()
                .script("http://e1.test", vec![Reply::Fail("reset by peer")])
                .script("http://e2.test", vec![Reply::Status(200, "e2")]),
            ScriptedHealth::new(),
            &ordering,
        )
        .await;

        let served = result.unwrap();
        assert_eq!(served.endpoint.origin(), "http://e2.test");
        assert_eq!(
            served.tried[0].failure_reason,
            FailureReason::Forward(ForwardCause::Network("reset by peer".into()))
        );
    }

    #[tokio::test]
    async fn test_all_unhealthy_exhausts() {
        let ordering = vec![endpoint("http://e1.test"), endpoint("http://e2.test")];
        let (result, transport, _) = run(
            ScriptedTransport::new(),
            ScriptedHealth::new()
                .unhealthy("http://e1.test", Duration::ZERO)
                .unhealthy("http://e2.test", Duration::ZERO),
            &ordering,
        )
        .await;

        let err = result.unwrap_err();
        let origins: Vec<&str> = err.tried_endpoints.iter().map(|t| t.endpoint.origin()).collect();
        assert_eq!(origins, vec!["http://e1.test", "http://e2.test"]);
        assert!(transport.calls().is_empty());
    }
}
