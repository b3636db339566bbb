//! Outbound HTTP: the transport seam, its ureq implementation, and Nominatim lookups.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use super::types::{Coordinate, LinkError};
use crate::config::ResolverConfig;

/// Redirects followed within a single short-link request.
const MAX_REDIRECTS_PER_REQUEST: u32 = 10;

/// HTTP capabilities the resolver needs. One network attempt per call, no retries.
pub trait Transport: Send + Sync {
    /// GET `url` and decode the body as JSON.
    fn get_json(&self, url: &Url) -> Result<serde_json::Value, LinkError>;

    /// HEAD `url` following redirects; returns the final URL.
    fn resolve_redirect(&self, url: &str) -> Result<String, LinkError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get_json(&self, url: &Url) -> Result<serde_json::Value, LinkError> {
        (**self).get_json(url)
    }

    fn resolve_redirect(&self, url: &str) -> Result<String, LinkError> {
        (**self).resolve_redirect(url)
    }
}

// ─── ureq transport ─────────────────────────────────────────────

/// Blocking transport backed by a shared ureq agent.
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &ResolverConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .redirects(MAX_REDIRECTS_PER_REQUEST)
            .build();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Transport for UreqTransport {
    fn get_json(&self, url: &Url) -> Result<serde_json::Value, LinkError> {
        let response = self
            .agent
            .get(url.as_str())
            .set("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| LinkError::Transport(e.to_string()))?;

        response
            .into_json()
            .map_err(|e| LinkError::Transport(format!("invalid response body: {}", e)))
    }

    fn resolve_redirect(&self, url: &str) -> Result<String, LinkError> {
        let response = self
            .agent
            .head(url)
            .set("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| LinkError::Transport(e.to_string()))?;

        Ok(response.get_url().to_string())
    }
}

// ─── Nominatim provider ─────────────────────────────────────────

/// Nominatim reports degrees as strings; some compatible services use numbers.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum Degrees {
    Text(String),
    Number(f64),
}

impl Degrees {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Text(s) => s.trim().parse().ok(),
            Self::Number(n) => Some(*n),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
struct NominatimPlace {
    lat: Degrees,
    lon: Degrees,
}

#[derive(Deserialize, Debug, Clone, Default)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
}

/// Build the `/search` URL for a free-text address, limited to one result.
pub fn search_url(config: &ResolverConfig, address: &str) -> Result<Url, LinkError> {
    Url::parse_with_params(
        &config.nominatim_endpoint("search"),
        &[("q", address), ("format", "json"), ("limit", "1")],
    )
    .map_err(|e| LinkError::InvalidInput(format!("bad geocoder url: {}", e)))
}

/// Build the `/reverse` URL for a coordinate.
pub fn reverse_url(config: &ResolverConfig, lat: f64, lng: f64) -> Result<Url, LinkError> {
    Url::parse_with_params(
        &config.nominatim_endpoint("reverse"),
        &[
            ("lat", lat.to_string()),
            ("lon", lng.to_string()),
            ("format", "json".to_string()),
        ],
    )
    .map_err(|e| LinkError::InvalidInput(format!("bad geocoder url: {}", e)))
}

/// Forward-geocode via Nominatim. First candidate wins; any failure is "address not found".
pub fn nominatim_search(
    transport: &dyn Transport,
    config: &ResolverConfig,
    address: &str,
) -> Result<Coordinate, LinkError> {
    let url = search_url(config, address)?;

    let body = transport.get_json(&url).map_err(|e| {
        tracing::warn!(error = %e, "forward geocoding request failed");
        LinkError::address_not_found()
    })?;

    let places: Vec<NominatimPlace> = serde_json::from_value(body).map_err(|e| {
        tracing::warn!(error = %e, "unexpected forward geocoding payload");
        LinkError::address_not_found()
    })?;

    let first = places.first().ok_or_else(LinkError::address_not_found)?;
    match (first.lat.value(), first.lon.value()) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng).map_err(|e| {
            tracing::warn!(error = %e, "geocoder returned unusable coordinates");
            LinkError::address_not_found()
        }),
        _ => Err(LinkError::address_not_found()),
    }
}

/// Reverse-geocode via Nominatim into its `display_name`.
pub fn nominatim_reverse(
    transport: &dyn Transport,
    config: &ResolverConfig,
    lat: f64,
    lng: f64,
) -> Result<String, LinkError> {
    let url = reverse_url(config, lat, lng)?;

    let body = transport.get_json(&url).map_err(|e| {
        tracing::warn!(error = %e, "reverse geocoding request failed");
        e
    })?;

    // Nominatim answers `{"error": "Unable to geocode"}` with 200 for empty areas
    let reverse: NominatimReverse = serde_json::from_value(body).unwrap_or_default();
    reverse
        .display_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(LinkError::address_not_found_for_coordinates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maplink::test_utils::FakeTransport;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_search_url_encodes_address() {
        let url = search_url(&ResolverConfig::default(), "Via Roma 12, Udine").unwrap();
        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".into(), "Via Roma 12, Udine".into())));
        assert!(pairs.contains(&("limit".into(), "1".into())));
        assert!(pairs.contains(&("format".into(), "json".into())));
    }

    #[test]
    fn test_reverse_url() {
        let url = reverse_url(&ResolverConfig::default(), 46.05, 13.23).unwrap();
        assert_eq!(url.path(), "/reverse");
        assert_eq!(url.query(), Some("lat=46.05&lon=13.23&format=json"));
    }

    #[test]
    fn test_search_first_candidate_wins() {
        let fake = FakeTransport::new().with_json(
            "/search",
            json!([
                { "lat": "46.0569", "lon": "13.2348", "display_name": "Udine" },
                { "lat": "1.0", "lon": "2.0", "display_name": "Elsewhere" }
            ]),
        );
        let c = nominatim_search(&fake, &ResolverConfig::default(), "Udine").unwrap();
        assert_relative_eq!(c.lat, 46.0569);
        assert_relative_eq!(c.lng, 13.2348);
    }

    #[test]
    fn test_search_numeric_degrees() {
        let fake = FakeTransport::new().with_json("/search", json!([{ "lat": 45.1, "lon": 9.5 }]));
        let c = nominatim_search(&fake, &ResolverConfig::default(), "Pavia").unwrap();
        assert_relative_eq!(c.lat, 45.1);
    }

    #[test]
    fn test_search_empty_is_not_found() {
        let fake = FakeTransport::new().with_json("/search", json!([]));
        let err = nominatim_search(&fake, &ResolverConfig::default(), "nowhere").unwrap_err();
        assert_eq!(err, LinkError::NotFound("address not found".into()));
    }

    #[test]
    fn test_search_transport_failure_is_not_found() {
        let fake = FakeTransport::failing();
        let err = nominatim_search(&fake, &ResolverConfig::default(), "Udine").unwrap_err();
        assert_eq!(err.reason(), "address not found");
    }

    #[test]
    fn test_search_garbage_coordinates() {
        let fake = FakeTransport::new().with_json("/search", json!([{ "lat": "abc", "lon": "1" }]));
        assert!(nominatim_search(&fake, &ResolverConfig::default(), "x").is_err());
    }

    #[test]
    fn test_reverse_display_name() {
        let fake = FakeTransport::new().with_json(
            "/reverse",
            json!({ "display_name": "Via Roma, Udine, Friuli-Venezia Giulia, Italia" }),
        );
        let addr = nominatim_reverse(&fake, &ResolverConfig::default(), 46.05, 13.23).unwrap();
        assert_eq!(addr, "Via Roma, Udine, Friuli-Venezia Giulia, Italia");
    }

    #[test]
    fn test_reverse_error_payload_is_not_found() {
        let fake = FakeTransport::new().with_json("/reverse", json!({ "error": "Unable to geocode" }));
        let err = nominatim_reverse(&fake, &ResolverConfig::default(), 0.0, -150.0).unwrap_err();
        assert_eq!(err.reason(), "address not found for coordinates");
    }

    #[test]
    fn test_reverse_transport_failure() {
        let fake = FakeTransport::failing();
        let err = nominatim_reverse(&fake, &ResolverConfig::default(), 46.0, 13.0).unwrap_err();
        assert!(matches!(err, LinkError::Transport(_)));
    }
}
