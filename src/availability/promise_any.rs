//! Promise-any: race health checks against every candidate, forward to the
//! first one that reports healthy.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::availability::{AvailabilityStrategy, Served, StrategyContext};
use crate::error::{HealthCause, NoHealthyEndpointsError};
use crate::http::request::BufferedRequest;
use crate::load_balancer::endpoint::{Endpoint, FailureReason, TriedEndpoint};
use crate::observability::metrics;

/// Parallel, health-gated strategy.
///
/// Spawns one probe per candidate. The first healthy probe wins and every
/// other probe is aborted without being awaited. Tried endpoints record only
/// failed probes, in completion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromiseAny;

impl PromiseAny {
    /// Race the probes; returns the winner's index and the probes that
    /// failed before it finished.
    async fn race(
        ordering: &[Endpoint],
        health: &Arc<dyn crate::health::HealthChecker>,
    ) -> (Option<usize>, Vec<(usize, HealthCause)>) {
        let mut probes = JoinSet::new();
        for (index, endpoint) in ordering.iter().cloned().enumerate() {
            let health = Arc::clone(health);
            probes.spawn(async move { (index, health.check_health(&endpoint).await) });
        }

        let mut failed = Vec::new();
        let mut winner = None;
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((index, Ok(()))) => {
                    winner = Some(index);
                    break;
                }
                Ok((index, Err(e))) => failed.push((index, e.cause)),
                Err(e) => tracing::error!(error = %e, "Health probe task failed"),
            }
        }

        probes.abort_all();
        (winner, failed)
    }
}

#[async_trait]
impl AvailabilityStrategy for PromiseAny {
    fn name(&self) -> &'static str {
        "promise_any"
    }

    async fn execute(
        &self,
        ordering: &[Endpoint],
        request: &BufferedRequest,
        ctx: StrategyContext<'_>,
    ) -> Result<Served, NoHealthyEndpointsError> {
        let (winner, failed) = Self::race(ordering, ctx.health).await;

        let Some(winner) = winner else {
            // Every candidate is reported, in ordering order.
            let tried = ordering
                .iter()
                .enumerate()
                .map(|(index, endpoint)| {
                    let cause = failed
                        .iter()
                        .find(|(i, _)| *i == index)
                        .map(|(_, cause)| cause.clone())
                        .unwrap_or_else(|| HealthCause::Network("health probe aborted".to_string()));
                    metrics::record_failover(endpoint.origin(), "unhealthy");
                    TriedEndpoint::new(endpoint.clone(), FailureReason::Unhealthy(cause))
                })
                .collect();
            tracing::warn!(
                request_id = %request.request_id(),
                candidates = ordering.len(),
                "No candidate passed its health check"
            );
            return Err(NoHealthyEndpointsError { tried_endpoints: tried });
        };

        let mut tried: Vec<TriedEndpoint> = failed
            .into_iter()
            .map(|(index, cause)| {
                metrics::record_failover(ordering[index].origin(), "unhealthy");
                TriedEndpoint::new(ordering[index].clone(), FailureReason::Unhealthy(cause))
            })
            .collect();

        let endpoint = &ordering[winner];
        tracing::debug!(request_id = %request.request_id(), endpoint = %endpoint, "Health race won");

        match ctx.forwarder.forward(endpoint, request).await {
            Ok(response) => Ok(Served {
                response,
                endpoint: endpoint.clone(),
                tried,
            }),
            Err(e) => {
                tracing::warn!(
                    request_id = %request.request_id(),
                    endpoint = %endpoint,
                    error = %e.cause,
                    "Forward to health race winner failed"
                );
                let reason = FailureReason::Forward(e.cause);
                metrics::record_failover(endpoint.origin(), reason.label());
                tried.push(TriedEndpoint::new(endpoint.clone(), reason));
                Err(NoHealthyEndpointsError { tried_endpoints: tried })
            }
        }
    }
}
