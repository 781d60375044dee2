//! Steering subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (RequestGeo extension)
//!     → steering.rs (static list or geo-with-default)
//!     → geo.rs (GeoSelector: collect matching GeoEndpoints)
//!     → matcher.rs (test one rule against one request)
//!     → ordered Vec<Endpoint>: index 0 primary, rest failover
//! ```
//!
//! # Design Decisions
//! - Ordering is a pure function of (RequestGeo, config); no randomness
//! - Configuration order is preserved among matches
//! - Missing geo data never matches; the default list is used instead

pub mod geo;
pub mod matcher;
pub mod steering;

pub use geo::{GeoSelector, RequestGeo};
pub use steering::Steering;
