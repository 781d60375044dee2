//! Geo-steered HTTP load balancer with pluggable availability strategies.
//!
//! An inbound request is given an endpoint ordering (static, or steered by
//! request geo), its body is buffered once, and an availability strategy
//! walks the ordering until one endpoint produces an acceptable response.
//! If every endpoint is exhausted an optional recovery hook may answer
//! instead.

pub mod availability;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

#[cfg(test)]
mod testing;

pub use config::schema::ProxyConfig;
pub use error::{BalancerError, BalancerResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::LoadBalancer;
