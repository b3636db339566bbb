//! Map-link resolver: orchestrates matchers, short-link expansion and geocoding.
//!
//! Link flow:  matchers → (short link: HEAD → re-parse, bounded hops) → (address: forward geocode) → error
//! Site flow:  parse link → navigation link → reverse geocode (best effort)

use super::matchers::{self, LinkMatch};
use super::navigation::generate_maps_link;
use super::providers::{self, Transport, UreqTransport};
use super::types::{Coordinate, LinkError, LinkParseResult, ParsedLink, SiteLocation};
use crate::config::ResolverConfig;

/// Stateless resolver: immutable configuration plus a transport.
pub struct MapLinkResolver<T = UreqTransport> {
    transport: T,
    config: ResolverConfig,
}

impl MapLinkResolver<UreqTransport> {
    pub fn new(config: ResolverConfig) -> Self {
        let transport = UreqTransport::new(&config);
        Self { transport, config }
    }
}

impl<T: Transport> MapLinkResolver<T> {
    /// Create a resolver over a specific transport (for testing or sharing).
    pub fn with_transport(config: ResolverConfig, transport: T) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a pasted map link to coordinates.
    pub fn parse_map_link(&self, input: &str) -> LinkParseResult {
        self.parse_with_hops(input, 0)
    }

    /// Same as [`parse_map_link`](Self::parse_map_link) for a possibly absent field.
    pub fn parse_optional(&self, input: Option<&str>) -> LinkParseResult {
        match input {
            Some(s) => self.parse_map_link(s),
            None => Err(LinkError::InvalidInput("no link provided".into())),
        }
    }

    /// Follow a short link's redirects and parse where it lands.
    pub fn expand_short_link(&self, url: &str) -> LinkParseResult {
        let url = url.trim();
        if url.is_empty() {
            return Err(LinkError::InvalidInput("empty link".into()));
        }
        self.expand_with_hops(url, 0)
    }

    /// Address text → coordinate, first candidate only.
    pub fn geocode_address(&self, address: &str) -> Result<Coordinate, LinkError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(LinkError::InvalidInput("empty address".into()));
        }
        providers::nominatim_search(&self.transport, &self.config, address)
    }

    /// Coordinate → human-readable address.
    pub fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<String, LinkError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(LinkError::InvalidInput("coordinates are not numeric".into()));
        }
        providers::nominatim_reverse(&self.transport, &self.config, lat, lng)
    }

    /// Parse a link for a site record: coordinates, navigation link and an address.
    ///
    /// The address comes from the link when it carries one, otherwise from a
    /// reverse lookup. A failed lookup leaves it empty rather than failing the call.
    pub fn resolve_site_location(&self, link: &str) -> Result<SiteLocation, LinkError> {
        let parsed = self.parse_map_link(link)?;
        let maps_link = generate_maps_link(parsed.lat, parsed.lng);

        let address = match parsed.address {
            Some(address) => Some(address),
            None => match self.reverse_geocode(parsed.lat, parsed.lng) {
                Ok(address) => Some(address),
                Err(e) => {
                    tracing::warn!(error = %e, lat = parsed.lat, lng = parsed.lng, "no address for site");
                    None
                }
            },
        };

        Ok(SiteLocation {
            lat: parsed.lat,
            lng: parsed.lng,
            address,
            maps_link,
        })
    }

    fn parse_with_hops(&self, input: &str, hops: usize) -> LinkParseResult {
        let input = input.trim();
        if input.is_empty() {
            return Err(LinkError::InvalidInput("empty link".into()));
        }

        match matchers::match_link(input) {
            Some(LinkMatch::Coordinates(link)) => Ok(link),
            Some(LinkMatch::ShortLink(url)) => self.expand_with_hops(&url, hops),
            Some(LinkMatch::AddressQuery(address)) => {
                self.geocode_address(&address).map(ParsedLink::from)
            }
            None => Err(LinkError::UnrecognizedFormat),
        }
    }

    fn expand_with_hops(&self, url: &str, hops: usize) -> LinkParseResult {
        if hops >= self.config.max_redirect_hops {
            tracing::warn!(url, hops, "short link hop limit reached");
            return Err(LinkError::ShortLinkExpansion);
        }

        let Some(request) = matchers::normalize_url(url) else {
            tracing::warn!(url, "short link is not a URL");
            return Err(LinkError::ShortLinkExpansion);
        };

        let resolved = self.transport.resolve_redirect(&request).map_err(|e| {
            tracing::warn!(url, error = %e, "short link expansion failed");
            LinkError::ShortLinkExpansion
        })?;

        if matchers::normalize_url(&resolved).as_deref() == Some(request.as_str()) {
            tracing::warn!(url, "short link did not redirect");
            return Err(LinkError::ShortLinkExpansion);
        }
        tracing::debug!(from = url, to = %resolved, "expanded short link");

        match self.parse_with_hops(&resolved, hops + 1) {
            Err(LinkError::UnrecognizedFormat) | Err(LinkError::InvalidInput(_)) => {
                Err(LinkError::ShortLinkExpansion)
            }
            other => other,
        }
    }
}
