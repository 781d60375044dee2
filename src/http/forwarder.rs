//! Request forwarding.
//!
//! # Responsibilities
//! - Materialize the inbound body exactly once
//! - Rewrite the target URL onto an endpoint origin (path + query preserved)
//! - Copy method and headers, attach the body for body-capable methods
//! - Bound each attempt by the endpoint timeout
//! - Optionally retry transport failures with exponential backoff
//!
//! # Design Decisions
//! - `forward` never retries; `forward_with_retry` is the only retry point
//! - HTTP responses of any status are successes at this layer
//! - Host is derived from the target URL, not copied from the inbound request

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};

use crate::error::{ForwardCause, RequestForwardError};
use crate::http::request::{is_body_capable, BufferedRequest};
use crate::http::transport::{OutboundRequest, Transport, TransportError};
use crate::load_balancer::endpoint::Endpoint;
use crate::resilience::backoff::RetryPolicy;
use crate::resilience::retries::retry_with_backoff;
use crate::resilience::timeouts::with_deadline;
use crate::routing::RequestGeo;

/// Default cap for buffered request bodies (2MB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RequestForwarder {
    transport: Arc<dyn Transport>,
    max_body_bytes: usize,
}

impl RequestForwarder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Read the inbound body into memory.
    ///
    /// Must run once per inbound request, before any forward attempt. Bodyless
    /// methods skip the read and carry no body.
    pub async fn buffer_body(&self, request: Request<Body>) -> Result<BufferedRequest, RequestForwardError> {
        let (mut parts, body) = request.into_parts();
        let geo = parts.extensions.remove::<RequestGeo>();

        let body = if is_body_capable(&parts.method) {
            let bytes = axum::body::to_bytes(body, self.max_body_bytes)
                .await
                .map_err(|e| RequestForwardError::body_read(e.to_string()))?;
            Some(bytes)
        } else {
            None
        };

        Ok(BufferedRequest {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            geo,
        })
    }

    /// Forward once to `endpoint`.
    pub async fn forward(
        &self,
        endpoint: &Endpoint,
        request: &BufferedRequest,
    ) -> Result<Response<Body>, RequestForwardError> {
        let url = endpoint
            .target_url(request.path_and_query())
            .map_err(|e| RequestForwardError::new(endpoint.url(), ForwardCause::InvalidTarget(e.to_string())))?;

        let mut headers = request.headers.clone();
        headers.remove(header::HOST);

        let body = if is_body_capable(&request.method) {
            request.body.clone()
        } else {
            None
        };
        if body.is_none() {
            headers.remove(header::CONTENT_LENGTH);
        }

        let outbound = OutboundRequest {
            method: request.method.clone(),
            url,
            headers,
            body,
        };

        tracing::debug!(
            request_id = %request.request_id(),
            endpoint = %endpoint,
            method = %request.method,
            "Forwarding request"
        );

        match with_deadline(endpoint.timeout(), self.transport.send(outbound)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(TransportError::Timeout)) => Err(RequestForwardError::new(
                endpoint.url(),
                ForwardCause::Timeout(endpoint.timeout()),
            )),
            Ok(Err(TransportError::Network(message))) => Err(RequestForwardError::new(
                endpoint.url(),
                ForwardCause::Network(message),
            )),
            Err(elapsed) => Err(RequestForwardError::new(endpoint.url(), ForwardCause::Timeout(elapsed.0))),
        }
    }

    /// Forward with bounded exponential backoff on transport failures.
    pub async fn forward_with_retry(
        &self,
        endpoint: &Endpoint,
        request: &BufferedRequest,
        policy: Option<&RetryPolicy>,
    ) -> Result<Response<Body>, RequestForwardError> {
        retry_with_backoff(policy, move |attempt| async move {
            let result = self.forward(endpoint, request).await;
            if let Err(e) = &result {
                tracing::warn!(
                    request_id = %request.request_id(),
                    endpoint = %endpoint,
                    attempt = attempt + 1,
                    error = %e.cause,
                    "Upstream error"
                );
            }
            result
        })
        .await
    }
}
