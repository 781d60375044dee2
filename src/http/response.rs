//! Response handling.
//!
//! # Responsibilities
//! - Stamp routing observability headers on served responses
//! - Map balancer errors to client-facing HTTP responses
//!
//! # Design Decisions
//! - Upstream responses are streamed through, never buffered
//! - Tried-endpoint headers appear only when a failover happened
//! - Exhaustion maps to 503 with a JSON body naming every tried endpoint

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::{BalancerError, ForwardCause, NoHealthyEndpointsError};
use crate::load_balancer::endpoint::{Endpoint, TriedEndpoint};

pub const X_LB_ENDPOINT: HeaderName = HeaderName::from_static("x-load-balancer-endpoint");
pub const X_LB_LATENCY: HeaderName = HeaderName::from_static("x-load-balancer-latency");
pub const X_LB_GATHER_LATENCY: HeaderName = HeaderName::from_static("x-load-balancer-endpoint-gather-latency");
pub const X_LB_TRIED_COUNT: HeaderName = HeaderName::from_static("x-load-balancer-tried-count");
pub const X_LB_TRIED_ENDPOINTS: HeaderName = HeaderName::from_static("x-load-balancer-tried-endpoints");

/// Observability data for one served request.
#[derive(Debug)]
pub struct RoutingReport<'a> {
    pub endpoint: &'a Endpoint,
    pub latency: Duration,
    pub gather_latency: Duration,
    pub tried: &'a [TriedEndpoint],
}

impl RoutingReport<'_> {
    pub fn stamp(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(self.endpoint.origin()) {
            headers.insert(X_LB_ENDPOINT, value);
        }
        headers.insert(X_LB_LATENCY, HeaderValue::from(millis(self.latency)));
        headers.insert(X_LB_GATHER_LATENCY, HeaderValue::from(millis(self.gather_latency)));

        if self.tried.is_empty() {
            return;
        }

        headers.insert(X_LB_TRIED_COUNT, HeaderValue::from(self.tried.len()));
        let joined = self
            .tried
            .iter()
            .map(|t| t.endpoint.origin())
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&joined) {
            headers.insert(X_LB_TRIED_ENDPOINTS, value);
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn exhausted_response(error: &NoHealthyEndpointsError) -> Response<Body> {
    let tried: Vec<_> = error
        .tried_endpoints
        .iter()
        .map(|t| {
            json!({
                "endpoint": t.endpoint.origin(),
                "reason": t.failure_reason.to_string(),
            })
        })
        .collect();

    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "no_healthy_endpoints",
            "message": error.to_string(),
            "tried_endpoints": tried,
        })),
    )
        .into_response()
}

impl IntoResponse for BalancerError {
    fn into_response(self) -> Response<Body> {
        match &self {
            BalancerError::NoHealthyEndpoints(e) => exhausted_response(e),
            BalancerError::Forward(e) => {
                let status = match e.cause {
                    ForwardCause::BodyRead(_) => StatusCode::BAD_REQUEST,
                    ForwardCause::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    ForwardCause::Network(_) | ForwardCause::InvalidTarget(_) => StatusCode::BAD_GATEWAY,
                };
                (status, Json(json!({ "error": "forward_failed", "message": self.to_string() }))).into_response()
            }
            BalancerError::CircuitOpen(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "circuit_open", "message": self.to_string() })),
            )
                .into_response(),
        }
    }
}
