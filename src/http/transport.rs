//! Outbound network transport.
//!
//! The balancer treats the network as a black box: a method, URL, headers
//! and optional body go in, a response or a failure comes out. Deadlines are
//! applied by callers, not by the transport.

use std::fmt::Debug;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Response};
use thiserror::Error;
use url::Url;

/// One outbound call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// A bodyless GET, as used by health probes.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// Transport-level failure.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),

    #[error("transport timed out")]
    Timeout,
}

/// Capability to send one HTTP call upstream.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: OutboundRequest) -> Result<Response<Body>, TransportError>;
}

/// Maximum redirect hops the HTTP transport follows.
pub const MAX_REDIRECTS: usize = 10;

/// `reqwest`-backed transport. Follows redirects and streams response bodies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .no_proxy()
            .user_agent(concat!("geo-balancer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Response<Body>, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let upstream = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = upstream.status();
        let headers = upstream.headers().clone();

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
