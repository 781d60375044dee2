//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → LoadBalancer::from_config
//!
//! On reload (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server builds a fresh LoadBalancer and swaps it in atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, resolve_config, ConfigError};
pub use schema::{
    AvailabilityConfig, AvailabilityMode, EndpointConfig, GeoEndpointConfig, GeoHeaderConfig, LimitsConfig,
    ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RecoveryConfig, RetryConfig, SteeringConfig,
    SteeringMode,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
