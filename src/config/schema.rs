//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::availability::DEFAULT_FAILOVER_STATUSES;
use crate::http::forwarder::DEFAULT_MAX_BODY_BYTES;
use crate::load_balancer::endpoint::{Endpoint, GeoConfig, GeoEndpoint, DEFAULT_HEALTH_CHECK_PATH};

/// Root configuration for the balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Static endpoint list; also the fallback list in geo mode.
    pub endpoints: Vec<EndpointConfig>,

    /// Endpoints with geographic matching rules.
    pub geo_endpoints: Vec<GeoEndpointConfig>,

    /// How a request's endpoint ordering is chosen.
    pub steering: SteeringConfig,

    /// How the ordering is walked.
    pub availability: AvailabilityConfig,

    /// Retry policy for forward attempts. Absent means no retry.
    pub retries: Option<RetryConfig>,

    /// Fallback response on exhaustion.
    pub recovery: RecoveryConfig,

    /// Header names the hosting layer reads geo metadata from.
    pub geo_headers: GeoHeaderConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream endpoint definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Absolute origin (e.g., "https://api.example.com").
    pub url: String,

    /// Path probed by health checks.
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,

    /// Reserved; no selection algorithm reads it.
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Per-attempt deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_health_check_path() -> String {
    DEFAULT_HEALTH_CHECK_PATH.to_string()
}

fn default_weight() -> u32 {
    1
}

fn default_timeout_ms() -> u64 {
    5000
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            health_check_path: default_health_check_path(),
            weight: default_weight(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn to_endpoint(&self) -> Result<Endpoint, url::ParseError> {
        Ok(Endpoint::new(&self.url)?
            .with_health_check_path(self.health_check_path.clone())
            .with_weight(self.weight)
            .with_timeout(Duration::from_millis(self.timeout_ms)))
    }
}

/// Endpoint with a geo rule, e.g. `geo = { continent = ["EU"] }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoEndpointConfig {
    #[serde(flatten)]
    pub endpoint: EndpointConfig,

    pub geo: GeoConfig,
}

impl GeoEndpointConfig {
    pub fn to_geo_endpoint(&self) -> Result<GeoEndpoint, url::ParseError> {
        Ok(GeoEndpoint::new(self.endpoint.to_endpoint()?, self.geo.clone()))
    }
}

/// Steering policy selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub mode: SteeringMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SteeringMode {
    /// Always use `endpoints` as listed.
    #[default]
    Static,
    /// Match `geo_endpoints` against request geo, fall back to `endpoints`.
    Geo,
}

/// Availability strategy selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    pub mode: AvailabilityMode,

    /// Response statuses that trigger failover under `fail_forward`.
    pub failover_on_statuses: Vec<u16>,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            mode: AvailabilityMode::default(),
            failover_on_statuses: DEFAULT_FAILOVER_STATUSES.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityMode {
    #[default]
    FailForward,
    AsyncBlock,
    PromiseAny,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Extra attempts beyond the first.
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds.
    pub initial_delay_ms: u64,

    /// Cap on any single delay in milliseconds.
    pub max_delay_ms: u64,

    /// Multiplier applied per retry.
    pub factor: f64,

    /// Random extra delay as a fraction of the computed delay (0.0 - 1.0).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 100,
            max_delay_ms: 2000,
            factor: 2.0,
            jitter: 0.0,
        }
    }
}

/// Static fallback response served when every endpoint is exhausted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub enabled: bool,
    pub status: u16,
    pub body: String,
    pub content_type: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            status: 503,
            body: "Service temporarily unavailable".to_string(),
            content_type: "text/plain; charset=utf-8".to_string(),
        }
    }
}

/// Request header names carrying geo metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoHeaderConfig {
    pub continent: String,
    pub country: String,
    pub region: String,
    pub colo: String,
}

impl Default for GeoHeaderConfig {
    fn default() -> Self {
        Self {
            continent: "cf-ipcontinent".to_string(),
            country: "cf-ipcountry".to_string(),
            region: "cf-region-code".to_string(),
            colo: "x-colo".to_string(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
