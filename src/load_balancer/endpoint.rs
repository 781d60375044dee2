//! Endpoint configuration values.
//!
//! # Responsibilities
//! - Represent one upstream origin with its health-check path and deadline
//! - Pair endpoints with geographic matching rules
//! - Record attempt outcomes for a single strategy run
//!
//! All values here are built once at setup and shared read-only across
//! requests.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ForwardCause, HealthCause};

/// Default health-check path.
pub const DEFAULT_HEALTH_CHECK_PATH: &str = "/";

/// Default per-attempt deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// A single upstream origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    health_check_path: String,
    weight: u32,
    timeout: Duration,
}

impl Endpoint {
    /// Create an endpoint from an absolute origin URL with default settings.
    pub fn new(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::from_url(Url::parse(url)?))
    }

    pub fn from_url(url: Url) -> Self {
        Self {
            url,
            health_check_path: DEFAULT_HEALTH_CHECK_PATH.to_string(),
            weight: 1,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_health_check_path(mut self, path: impl Into<String>) -> Self {
        self.health_check_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Weight is carried for forward compatibility; no selection uses it.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The origin without a trailing slash, as reported in response headers.
    pub fn origin(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    pub fn health_check_path(&self) -> &str {
        &self.health_check_path
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Rewrite an inbound path and query onto this endpoint.
    pub fn target_url(&self, path_and_query: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}{}", self.origin(), path_and_query))
    }

    /// URL probed by live health checks.
    pub fn health_url(&self) -> Result<Url, url::ParseError> {
        self.target_url(&self.health_check_path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.origin())
    }
}

/// Which request geo field a rule tests, and the codes that match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoConfig {
    Continent(BTreeSet<String>),
    Country(BTreeSet<String>),
    Region(BTreeSet<String>),
    Colo(BTreeSet<String>),
}

impl GeoConfig {
    pub fn codes(&self) -> &BTreeSet<String> {
        match self {
            GeoConfig::Continent(codes)
            | GeoConfig::Country(codes)
            | GeoConfig::Region(codes)
            | GeoConfig::Colo(codes) => codes,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GeoConfig::Continent(_) => "continent",
            GeoConfig::Country(_) => "country",
            GeoConfig::Region(_) => "region",
            GeoConfig::Colo(_) => "colo",
        }
    }
}

/// An endpoint paired with a geographic matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoEndpoint {
    pub endpoint: Endpoint,
    pub geo: GeoConfig,
}

impl GeoEndpoint {
    pub fn new(endpoint: Endpoint, geo: GeoConfig) -> Self {
        Self { endpoint, geo }
    }
}

/// Why an endpoint was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The forward call itself failed.
    Forward(ForwardCause),
    /// The endpoint answered with a failover-worthy status.
    Status(StatusCode),
    /// The health check rejected the endpoint.
    Unhealthy(HealthCause),
}

impl FailureReason {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::Forward(ForwardCause::Timeout(_)) => "timeout",
            FailureReason::Forward(_) => "network",
            FailureReason::Status(_) => "status",
            FailureReason::Unhealthy(_) => "unhealthy",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Forward(cause) => write!(f, "{}", cause),
            FailureReason::Status(status) => write!(f, "upstream returned {}", status),
            FailureReason::Unhealthy(cause) => write!(f, "{}", cause),
        }
    }
}

/// One abandoned endpoint, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriedEndpoint {
    pub endpoint: Endpoint,
    pub failure_reason: FailureReason,
}

impl TriedEndpoint {
    pub fn new(endpoint: Endpoint, failure_reason: FailureReason) -> Self {
        Self {
            endpoint,
            failure_reason,
        }
    }
}

/// Handed to the recovery hook on exhaustion.
#[derive(Debug, Clone)]
pub struct RecoveryContext {
    pub tried_endpoints: Vec<TriedEndpoint>,
    pub last_error: Option<FailureReason>,
}

impl RecoveryContext {
    pub fn new(tried_endpoints: Vec<TriedEndpoint>) -> Self {
        let last_error = tried_endpoints.last().map(|t| t.failure_reason.clone());
        Self {
            tried_endpoints,
            last_error,
        }
    }
}
