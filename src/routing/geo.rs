//! Geographic endpoint selection.

use std::collections::HashSet;

use crate::load_balancer::endpoint::{Endpoint, GeoEndpoint};

/// Geo metadata the hosting layer attaches to an inbound request.
///
/// Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestGeo {
    pub continent: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub colo: Option<String>,
}

impl RequestGeo {
    pub fn is_empty(&self) -> bool {
        self.continent.is_none() && self.country.is_none() && self.region.is_none() && self.colo.is_none()
    }
}

/// Turns request geo metadata into an ordered endpoint list.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoSelector;

impl GeoSelector {
    /// Collect every geo endpoint whose rule matches, in configuration order.
    ///
    /// Falls back to `defaults` unchanged when nothing matches, including
    /// when the request carries no geo data at all.
    pub fn select_ordering(
        geo: Option<&RequestGeo>,
        geo_endpoints: &[GeoEndpoint],
        defaults: &[Endpoint],
    ) -> Vec<Endpoint> {
        let matched: Vec<Endpoint> = match geo {
            Some(geo) => geo_endpoints
                .iter()
                .filter(|candidate| candidate.geo.matches(geo))
                .map(|candidate| candidate.endpoint.clone())
                .collect(),
            None => Vec::new(),
        };
        let matched = dedup_endpoints(matched);

        if matched.is_empty() {
            tracing::debug!(
                geo = ?geo,
                defaults = defaults.len(),
                "No geo endpoint matched, using default endpoints"
            );
            return dedup_endpoints(defaults.to_vec());
        }

        tracing::debug!(geo = ?geo, matched = matched.len(), "Geo endpoints matched");
        matched
    }
}

/// Drop later entries that repeat an earlier endpoint URL.
///
/// An origin listed under several matching rules keeps its first position.
pub fn dedup_endpoints(endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    let mut seen = HashSet::new();
    endpoints
        .into_iter()
        .filter(|endpoint| seen.insert(endpoint.url().clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::endpoint::GeoConfig;

    fn geo_endpoint(url: &str, rule: GeoConfig) -> GeoEndpoint {
        GeoEndpoint::new(Endpoint::new(url).unwrap(), rule)
    }

    fn continent(codes: &[&str]) -> GeoConfig {
        GeoConfig::Continent(codes.iter().map(|c| c.to_string()).collect())
    }

    fn setup() -> (Vec<GeoEndpoint>, Vec<Endpoint>) {
        let geo_endpoints = vec![
            geo_endpoint("http://na.test", continent(&["NA"])),
            geo_endpoint("http://eu.test", continent(&["EU"])),
        ];
        let defaults = vec![
            Endpoint::new("http://default-1.test").unwrap(),
            Endpoint::new("http://default-2.test").unwrap(),
        ];
        (geo_endpoints, defaults)
    }

    #[test]
    fn test_eu_request_selects_eu_endpoint_first() {
        let (geo_endpoints, defaults) = setup();
        let geo = RequestGeo {
            continent: Some("EU".into()),
            ..Default::default()
        };

        let ordering = GeoSelector::select_ordering(Some(&geo), &geo_endpoints, &defaults);
        assert_eq!(ordering[0].origin(), "http://eu.test");
    }

    #[test]
    fn test_missing_geo_uses_defaults() {
        let (geo_endpoints, defaults) = setup();

        let ordering = GeoSelector::select_ordering(Some(&RequestGeo::default()), &geo_endpoints, &defaults);
        assert_eq!(ordering, defaults);

        let ordering = GeoSelector::select_ordering(None, &geo_endpoints, &defaults);
        assert_eq!(ordering, defaults);
    }

    #[test]
    fn test_unmatched_geo_uses_defaults() {
        let (geo_endpoints, defaults) = setup();
        let geo = RequestGeo {
            continent: Some("OC".into()),
            ..Default::default()
        };
        assert_eq!(GeoSelector::select_ordering(Some(&geo), &geo_endpoints, &defaults), defaults);
    }

    #[test]
    fn test_multiple_matches_keep_config_order() {
        let geo_endpoints = vec![
            geo_endpoint("http://fra.test", GeoConfig::Colo(["FRA".to_string()].into())),
            geo_endpoint("http://de.test", GeoConfig::Country(["DE".to_string()].into())),
            geo_endpoint("http://us.test", GeoConfig::Country(["US".to_string()].into())),
            geo_endpoint("http://eu.test", continent(&["EU"])),
        ];
        let geo = RequestGeo {
            continent: Some("EU".into()),
            country: Some("DE".into()),
            region: None,
            colo: Some("FRA".into()),
        };

        let ordering = GeoSelector::select_ordering(Some(&geo), &geo_endpoints, &[]);
        let origins: Vec<&str> = ordering.iter().map(Endpoint::origin).collect();
        assert_eq!(origins, vec!["http://fra.test", "http://de.test", "http://eu.test"]);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let (geo_endpoints, defaults) = setup();
        let geo = RequestGeo {
            continent: Some("NA".into()),
            ..Default::default()
        };

        let first = GeoSelector::select_ordering(Some(&geo), &geo_endpoints, &defaults);
        for _ in 0..50 {
            assert_eq!(GeoSelector::select_ordering(Some(&geo), &geo_endpoints, &defaults), first);
        }
    }

    #[test]
    fn test_origin_under_two_matching_rules_listed_once() {
        let geo_endpoints = vec![
            geo_endpoint("http://eu.test", GeoConfig::Country(["DE".to_string()].into())),
            geo_endpoint("http://eu.test", continent(&["EU"])),
            geo_endpoint("http://backup.test", continent(&["EU"])),
        ];
        let geo = RequestGeo {
            continent: Some("EU".into()),
            country: Some("DE".into()),
            ..Default::default()
        };

        let ordering = GeoSelector::select_ordering(Some(&geo), &geo_endpoints, &[]);
        let origins: Vec<&str> = ordering.iter().map(Endpoint::origin).collect();
        assert_eq!(origins, vec!["http://eu.test", "http://backup.test"]);
    }

    #[test]
    fn test_repeated_defaults_listed_once() {
        let defaults = vec![
            Endpoint::new("http://a.test").unwrap(),
            Endpoint::new("http://b.test").unwrap(),
            Endpoint::new("http://a.test").unwrap(),
        ];
        let ordering = GeoSelector::select_ordering(None, &[], &defaults);
        assert_eq!(ordering, defaults[..2].to_vec());
    }
}
