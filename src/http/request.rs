//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for tracing
//! - Extract geo metadata from configured headers
//! - Hold the buffered request that every forward attempt replays

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, Version};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::config::GeoHeaderConfig;
use crate::routing::RequestGeo;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID of a request, or `"unknown"` if none was assigned.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Methods that never carry a forwarded body.
pub fn is_body_capable(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Read geo metadata from the configured header names.
///
/// Missing, empty or non-UTF-8 values are treated as absent.
pub fn extract_geo(headers: &HeaderMap, names: &GeoHeaderConfig) -> RequestGeo {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    RequestGeo {
        continent: read(&names.continent),
        country: read(&names.country),
        region: read(&names.region),
        colo: read(&names.colo),
    }
}

/// An inbound request whose body has been read into memory once.
///
/// Every forward attempt, including failovers and retries, replays this.
#[derive(Debug, Clone)]
pub struct BufferedRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    /// `None` for bodyless methods.
    pub body: Option<Bytes>,
    pub geo: Option<RequestGeo>,
}

impl BufferedRequest {
    /// Original path plus query string, as appended to endpoint origins.
    pub fn path_and_query(&self) -> &str {
        self.uri.path_and_query().map_or("/", |pq| pq.as_str())
    }

    pub fn request_id(&self) -> &str {
        request_id(&self.headers)
    }
}
