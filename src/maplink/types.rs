//! Core types for map-link resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NotNumeric);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }
}

/// Successful outcome of parsing a map link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLink {
    pub lat: f64,
    pub lng: f64,
    /// Place name carried by the link itself (e.g. `/place/Via+Roma/...`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ParsedLink {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate { lat: self.lat, lng: self.lng }
    }
}

impl From<Coordinate> for ParsedLink {
    fn from(c: Coordinate) -> Self {
        Self { lat: c.lat, lng: c.lng, address: None }
    }
}

/// A parsed link enriched for a site record: navigation link plus a
/// best-effort human-readable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
    pub maps_link: String,
}

/// Why a link could not be resolved. Every variant is recoverable by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unrecognized link format")]
    UnrecognizedFormat,
    #[error("network error: {0}")]
    Transport(String),
    #[error("could not expand short link")]
    ShortLinkExpansion,
    #[error("{0}")]
    NotFound(String),
}

impl LinkError {
    /// Caller-facing message for this failure.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    pub(crate) fn address_not_found() -> Self {
        Self::NotFound("address not found".into())
    }

    pub(crate) fn address_not_found_for_coordinates() -> Self {
        Self::NotFound("address not found for coordinates".into())
    }
}

/// Outcome of `parse_map_link` and `expand_short_link`.
pub type LinkParseResult = Result<ParsedLink, LinkError>;

/// Coordinate validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinates are not numeric")]
    NotNumeric,
    #[error("latitude must be between -90 and 90 (got {0})")]
    LatitudeOutOfRange(f64),
    #[error("longitude must be between -180 and 180 (got {0})")]
    LongitudeOutOfRange(f64),
}
