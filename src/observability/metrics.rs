//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): requests by method, status, endpoint
//! - `balancer_request_duration_seconds` (histogram): latency per endpoint
//! - `balancer_failovers_total` (counter): abandoned endpoints by reason
//! - `balancer_exhaustions_total` (counter): strategy runs with no endpoint left
//! - `balancer_recoveries_total` (counter): recovery hook outcomes
//! - `balancer_health_checks_total` (counter): probes by result
//! - `balancer_endpoint_health` (gauge): 1=healthy, 0=unhealthy
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - Labels use endpoint origins, never full request URLs

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, endpoint: &str, start: Instant) {
    counter!(
        "balancer_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
    histogram!("balancer_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_failover(endpoint: &str, reason: &'static str) {
    counter!("balancer_failovers_total", "endpoint" => endpoint.to_string(), "reason" => reason).increment(1);
}

pub fn record_exhaustion(strategy: &'static str) {
    counter!("balancer_exhaustions_total", "strategy" => strategy).increment(1);
}

/// `outcome` is `"recovered"` or `"declined"`.
pub fn record_recovery(outcome: &'static str) {
    counter!("balancer_recoveries_total", "outcome" => outcome).increment(1);
}

pub fn record_health_check(endpoint: &str, healthy: bool) {
    let result = if healthy { "healthy" } else { "unhealthy" };
    counter!("balancer_health_checks_total", "endpoint" => endpoint.to_string(), "result" => result).increment(1);
    gauge!("balancer_endpoint_health", "endpoint" => endpoint.to_string()).set(if healthy { 1.0 } else { 0.0 });
}
