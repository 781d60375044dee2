//! Steering policy: which endpoint ordering a request uses.

use crate::load_balancer::endpoint::{Endpoint, GeoEndpoint};
use crate::routing::geo::{dedup_endpoints, GeoSelector, RequestGeo};

/// Steering policy, fixed at setup.
#[derive(Debug, Clone)]
pub enum Steering {
    /// Always use the configured list as-is.
    Static(Vec<Endpoint>),
    /// Steer by request geo, falling back to `defaults` when nothing matches.
    Geo {
        geo_endpoints: Vec<GeoEndpoint>,
        defaults: Vec<Endpoint>,
    },
}

impl Steering {
    /// Compute the endpoint ordering for one request.
    pub fn ordering(&self, geo: Option<&RequestGeo>) -> Vec<Endpoint> {
        match self {
            Steering::Static(endpoints) => dedup_endpoints(endpoints.clone()),
            Steering::Geo {
                geo_endpoints,
                defaults,
            } => GeoSelector::select_ordering(geo, geo_endpoints, defaults),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Steering::Static(_) => "static",
            Steering::Geo { .. } => "geo",
        }
    }
}
