//! Request orchestration.
//!
//! ```text
//! request
//!     → Steering::ordering (gather latency measured here)
//!     → RequestForwarder::buffer_body (exactly once)
//!     → AvailabilityStrategy::execute
//!         ├─ Served → stamp observability headers → response
//!         └─ NoHealthyEndpointsError → RecoveryHandler (once) or propagate
//! ```
//!
//! A `LoadBalancer` is immutable once built. Concurrent requests share it
//! read-only; reconfiguration builds a new one.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::availability::{self, AvailabilityStrategy, FailForward, StrategyContext};
use crate::config::{ProxyConfig, SteeringMode};
use crate::error::{BalancerResult, BuildError};
use crate::health::{HealthChecker, LiveHealthChecker};
use crate::http::forwarder::{RequestForwarder, DEFAULT_MAX_BODY_BYTES};
use crate::http::response::RoutingReport;
use crate::http::transport::{HttpTransport, Transport};
use crate::load_balancer::endpoint::{Endpoint, GeoEndpoint, RecoveryContext};
use crate::load_balancer::recovery::{RecoveryHandler, StaticRecovery};
use crate::observability::metrics;
use crate::resilience::backoff::RetryPolicy;
use crate::routing::{RequestGeo, Steering};

#[derive(Debug)]
pub struct LoadBalancer {
    steering: Steering,
    strategy: Arc<dyn AvailabilityStrategy>,
    forwarder: RequestForwarder,
    health: Arc<dyn HealthChecker>,
    retry_policy: Option<RetryPolicy>,
    recovery: Option<Arc<dyn RecoveryHandler>>,
}

impl LoadBalancer {
    pub fn builder() -> LoadBalancerBuilder {
        LoadBalancerBuilder::default()
    }

    /// Build a balancer backed by the real HTTP transport and live health
    /// checks.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, BuildError> {
        let endpoints = config
            .endpoints
            .iter()
            .map(|e| {
                e.to_endpoint().map_err(|source| BuildError::InvalidEndpoint {
                    url: e.url.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let geo_endpoints = config
            .geo_endpoints
            .iter()
            .map(|g| {
                g.to_geo_endpoint().map_err(|source| BuildError::InvalidEndpoint {
                    url: g.endpoint.url.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = Self::builder()
            .endpoints(endpoints)
            .geo_endpoints(geo_endpoints)
            .steering(config.steering.mode)
            .strategy(availability::from_config(&config.availability))
            .max_body_bytes(config.limits.max_body_bytes);

        if let Some(retries) = &config.retries {
            builder = builder.retry_policy(RetryPolicy::from(retries));
        }
        if let Some(recovery) = StaticRecovery::from_config(&config.recovery)? {
            builder = builder.recovery(recovery);
        }

        builder.build()
    }

    pub fn steering(&self) -> &Steering {
        &self.steering
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Route one inbound request.
    ///
    /// Geo metadata is read from the [`RequestGeo`] request extension when
    /// present.
    pub async fn handle_request(&self, request: Request<Body>) -> BalancerResult<Response<Body>> {
        let start = Instant::now();

        let ordering = self.steering.ordering(request.extensions().get::<RequestGeo>());
        let gather_latency = start.elapsed();

        let buffered = self.forwarder.buffer_body(request).await?;
        let method = buffered.method.to_string();

        tracing::debug!(
            request_id = %buffered.request_id(),
            strategy = self.strategy.name(),
            candidates = ordering.len(),
            "Endpoint ordering computed"
        );

        let ctx = StrategyContext {
            forwarder: &self.forwarder,
            health: &self.health,
            retry_policy: self.retry_policy.as_ref(),
        };

        match self.strategy.execute(&ordering, &buffered, ctx).await {
            Ok(served) => {
                let mut response = served.response;
                RoutingReport {
                    endpoint: &served.endpoint,
                    latency: start.elapsed(),
                    gather_latency,
                    tried: &served.tried,
                }
                .stamp(response.headers_mut());

                metrics::record_request(&method, response.status().as_u16(), served.endpoint.origin(), start);
                Ok(response)
            }
            Err(exhausted) => {
                metrics::record_exhaustion(self.strategy.name());
                tracing::error!(
                    request_id = %buffered.request_id(),
                    strategy = self.strategy.name(),
                    tried = exhausted.tried_endpoints.len(),
                    "All endpoints exhausted"
                );

                let Some(recovery) = &self.recovery else {
                    return Err(exhausted.into());
                };

                let recovery_ctx = RecoveryContext::new(exhausted.tried_endpoints.clone());
                match recovery.recover(&recovery_ctx, &buffered).await {
                    Some(response) => {
                        metrics::record_recovery("recovered");
                        Ok(response)
                    }
                    None => {
                        metrics::record_recovery("declined");
                        tracing::debug!(request_id = %buffered.request_id(), "Recovery declined");
                        Err(exhausted.into())
                    }
                }
            }
        }
    }
}

/// Assembles a [`LoadBalancer`]. Unset collaborators default to the real
/// HTTP transport, live health checks and fail-forward.
#[derive(Default)]
pub struct LoadBalancerBuilder {
    endpoints: Vec<Endpoint>,
    geo_endpoints: Vec<GeoEndpoint>,
    steering: SteeringMode,
    strategy: Option<Arc<dyn AvailabilityStrategy>>,
    retry_policy: Option<RetryPolicy>,
    health: Option<Arc<dyn HealthChecker>>,
    transport: Option<Arc<dyn Transport>>,
    recovery: Option<Arc<dyn RecoveryHandler>>,
    max_body_bytes: Option<usize>,
}

impl LoadBalancerBuilder {
    pub fn endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn geo_endpoints(mut self, geo_endpoints: Vec<GeoEndpoint>) -> Self {
        self.geo_endpoints = geo_endpoints;
        self
    }

    pub fn steering(mut self, mode: SteeringMode) -> Self {
        self.steering = mode;
        self
    }

    pub fn strategy(mut self, strategy: Arc<dyn AvailabilityStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn availability(self, strategy: impl AvailabilityStrategy + 'static) -> Self {
        self.strategy(Arc::new(strategy))
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn health_checker(mut self, health: Arc<dyn HealthChecker>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn recovery(mut self, recovery: impl RecoveryHandler + 'static) -> Self {
        self.recovery = Some(Arc::new(recovery));
        self
    }

    pub fn max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = Some(max_body_bytes);
        self
    }

    pub fn build(self) -> Result<LoadBalancer, BuildError> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };
        let health = self
            .health
            .unwrap_or_else(|| Arc::new(LiveHealthChecker::new(transport.clone())));

        let steering = match self.steering {
            SteeringMode::Static => Steering::Static(self.endpoints),
            SteeringMode::Geo => Steering::Geo {
                geo_endpoints: self.geo_endpoints,
                defaults: self.endpoints,
            },
        };

        let strategy = self.strategy.unwrap_or_else(|| Arc::new(FailForward::default()));
        tracing::debug!(steering = steering.mode(), strategy = strategy.name(), "Load balancer built");

        Ok(LoadBalancer {
            steering,
            strategy,
            forwarder: RequestForwarder::new(transport)
                .with_max_body_bytes(self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES)),
            health,
            retry_policy: self.retry_policy,
            recovery: self.recovery,
        })
    }
}
