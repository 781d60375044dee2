//! Geo rule matching.
//!
//! # Design Decisions
//! - Codes compare ASCII case-insensitively ("eu" matches "EU")
//! - An absent request field never matches
//! - Each rule tests exactly one field: a continent rule ignores country, etc.

use crate::load_balancer::endpoint::GeoConfig;
use crate::routing::geo::RequestGeo;

impl GeoConfig {
    /// Returns true if the request's geo data satisfies this rule.
    pub fn matches(&self, geo: &RequestGeo) -> bool {
        let field = match self {
            GeoConfig::Continent(_) => geo.continent.as_deref(),
            GeoConfig::Country(_) => geo.country.as_deref(),
            GeoConfig::Region(_) => geo.region.as_deref(),
            GeoConfig::Colo(_) => geo.colo.as_deref(),
        };

        field
            .map(|value| self.codes().iter().any(|code| code.eq_ignore_ascii_case(value)))
            .unwrap_or(false)
    }
}
