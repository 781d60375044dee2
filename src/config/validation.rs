//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every endpoint URL is an absolute http(s) origin
//! - Validate value ranges (timeouts > 0, statuses valid, backoff sane)
//! - Check that the steering mode has endpoints to work with
//! - Reject an endpoint URL listed twice in `endpoints`
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::schema::{EndpointConfig, ProxyConfig, SteeringMode};

/// One semantic problem, located by a dotted config path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let mut seen = HashSet::new();
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        validate_endpoint(&format!("endpoints[{}]", i), endpoint, &mut errors);
        if let Ok(url) = Url::parse(&endpoint.url) {
            if !seen.insert(url) {
                errors.push(ValidationError::new(
                    format!("endpoints[{}].url", i),
                    format!("'{}' is listed more than once", endpoint.url),
                ));
            }
        }
    }

    for (i, geo_endpoint) in config.geo_endpoints.iter().enumerate() {
        let field = format!("geo_endpoints[{}]", i);
        validate_endpoint(&field, &geo_endpoint.endpoint, &mut errors);
        if geo_endpoint.geo.codes().is_empty() {
            errors.push(ValidationError::new(
                format!("{}.geo.{}", field, geo_endpoint.geo.kind()),
                "geo rule needs at least one code",
            ));
        }
    }

    match config.steering.mode {
        SteeringMode::Static if config.endpoints.is_empty() => {
            errors.push(ValidationError::new("endpoints", "static steering needs at least one endpoint"));
        }
        SteeringMode::Geo if config.endpoints.is_empty() && config.geo_endpoints.is_empty() => {
            errors.push(ValidationError::new(
                "geo_endpoints",
                "geo steering needs at least one endpoint or geo endpoint",
            ));
        }
        _ => {}
    }

    for status in &config.availability.failover_on_statuses {
        if StatusCode::from_u16(*status).is_err() {
            errors.push(ValidationError::new(
                "availability.failover_on_statuses",
                format!("{} is not an HTTP status", status),
            ));
        }
    }

    if let Some(retries) = &config.retries {
        if retries.factor < 1.0 {
            errors.push(ValidationError::new("retries.factor", "must be >= 1.0"));
        }
        if retries.initial_delay_ms > retries.max_delay_ms {
            errors.push(ValidationError::new(
                "retries.initial_delay_ms",
                "must not exceed retries.max_delay_ms",
            ));
        }
        if !(0.0..=1.0).contains(&retries.jitter) {
            errors.push(ValidationError::new("retries.jitter", "must be between 0.0 and 1.0"));
        }
    }

    if config.recovery.enabled && StatusCode::from_u16(config.recovery.status).is_err() {
        errors.push(ValidationError::new(
            "recovery.status",
            format!("{} is not an HTTP status", config.recovery.status),
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be > 0"));
    }

    if config.observability.metrics_enabled && config.observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_endpoint(field: &str, endpoint: &EndpointConfig, errors: &mut Vec<ValidationError>) {
    match Url::parse(&endpoint.url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(ValidationError::new(
                format!("{}.url", field),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url) if url.host().is_none() => {
            errors.push(ValidationError::new(format!("{}.url", field), "missing host"));
        }
        Ok(_) => {}
        Err(e) => {
            errors.push(ValidationError::new(
                format!("{}.url", field),
                format!("'{}' is not an absolute URL: {}", endpoint.url, e),
            ));
        }
    }

    if endpoint.timeout_ms == 0 {
        errors.push(ValidationError::new(format!("{}.timeout_ms", field), "must be > 0"));
    }

    if !endpoint.health_check_path.starts_with('/') {
        errors.push(ValidationError::new(
            format!("{}.health_check_path", field),
            "must start with '/'",
        ));
    }
}
