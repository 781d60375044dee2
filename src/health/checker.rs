//! Health-check capability.

use async_trait::async_trait;

use crate::error::EndpointUnhealthyError;
use crate::load_balancer::endpoint::Endpoint;

/// Decides whether an endpoint may receive traffic right now.
#[async_trait]
pub trait HealthChecker: Send + Sync + std::fmt::Debug {
    /// `Ok(())` when healthy; the error carries the probe failure otherwise.
    async fn check_health(&self, endpoint: &Endpoint) -> Result<(), EndpointUnhealthyError>;
}

/// Reports every endpoint as healthy. Used for deterministic tests and for
/// deployments that rely on fail-forward only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHealthy;

#[async_trait]
impl HealthChecker for AlwaysHealthy {
    async fn check_health(&self, _endpoint: &Endpoint) -> Result<(), EndpointUnhealthyError> {
        Ok(())
    }
}
