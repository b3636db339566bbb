//! Pure helpers: navigation links, coordinate validation, deep links, formatting.

use url::Url;

use super::matchers::host_of;
use super::types::{Coordinate, CoordinateError};

/// Origin sentinel that makes the map app start from the device's position.
pub const CURRENT_LOCATION: &str = "Current+Location";

/// Turn-by-turn driving directions from the current location to `(lat, lng)`.
///
/// No range check happens here: callers pass coordinates that already went
/// through [`validate_coordinates`] or came out of a successful parse.
pub fn generate_maps_link(lat: f64, lng: f64) -> String {
    format!(
        "https://maps.google.com/maps?saddr={}&daddr={},{}&directionsmode=driving",
        CURRENT_LOCATION, lat, lng
    )
}

/// Check a numeric pair. Latitude is reported before longitude.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<Coordinate, CoordinateError> {
    Coordinate::new(lat, lng)
}

/// Check a pair typed into a form field.
pub fn validate_coordinate_strs(lat: &str, lng: &str) -> Result<Coordinate, CoordinateError> {
    let lat: f64 = lat.trim().parse().map_err(|_| CoordinateError::NotNumeric)?;
    let lng: f64 = lng.trim().parse().map_err(|_| CoordinateError::NotNumeric)?;
    validate_coordinates(lat, lng)
}

/// Whether a shared URL points at a map provider.
pub fn is_map_link(url: &str) -> bool {
    let lower = url.to_lowercase();
    if lower.contains("google.com/maps") || lower.contains("goo.gl/maps") {
        return true;
    }
    match host_of(url) {
        Some(host) => {
            host.starts_with("maps.google.")
                || host == "maps.app.goo.gl"
                || host == "maps.apple.com"
        }
        None => false,
    }
}

/// Map link carried by the app's own launch URL (`?map=` preferred over `?url=`).
pub fn incoming_map_url(app_url: &str) -> Option<String> {
    let url = Url::parse(app_url).ok()?;
    let pick = |key: &str| {
        url.query_pairs()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    };
    pick("map").or_else(|| pick("url"))
}

/// e.g. `46.0569°N, 13.2348°E`
pub fn format_coords(lat: f64, lng: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lng.abs(), ew)
}
