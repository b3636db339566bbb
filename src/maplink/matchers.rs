//! Pattern matchers over raw map-link text.
//!
//! Order: `q=` → `ll=` → `/place/<name>/@lat,lng` → `@lat,lng` → short-link host → `address=`.
//! The first matcher that produces a usable result wins; there is no scoring.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::types::{Coordinate, ParsedLink};

/// Hosts that only redirect to the real map URL.
const SHORTENER_HOSTS: &[&str] = &["goo.gl", "g.co"];

static Q_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]q=([-+\d.]+)(?:,|%2[Cc])\s*([-+\d.]+)").expect("q regex should compile")
});

static LL_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]ll=([-+\d.]+)(?:,|%2[Cc])\s*([-+\d.]+)").expect("ll regex should compile")
});

static PLACE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/place/([^/]+)/@([-+\d.]+),([-+\d.]+)").expect("place regex should compile")
});

static AT_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([-+\d.]+),([-+\d.]+)").expect("at regex should compile")
});

static ADDRESS_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]address=([^&#]+)").expect("address regex should compile")
});

/// What a link turned out to be, before any network work.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkMatch {
    /// Coordinates embedded in the link.
    Coordinates(ParsedLink),
    /// A shortener URL that must be expanded first.
    ShortLink(String),
    /// A free-text address that must be forward-geocoded.
    AddressQuery(String),
}

/// Run the matchers in order against `input`.
pub fn match_link(input: &str) -> Option<LinkMatch> {
    if let Some(link) = match_query_coords(input) {
        tracing::debug!(matcher = "query", "matched map link");
        return Some(LinkMatch::Coordinates(link));
    }
    if let Some(link) = match_place(input) {
        tracing::debug!(matcher = "place", "matched map link");
        return Some(LinkMatch::Coordinates(link));
    }
    if let Some(link) = match_at(input) {
        tracing::debug!(matcher = "at", "matched map link");
        return Some(LinkMatch::Coordinates(link));
    }
    if let Some(url) = short_link_url(input) {
        tracing::debug!(matcher = "short_link", "matched map link");
        return Some(LinkMatch::ShortLink(url));
    }
    if let Some(address) = match_address_param(input) {
        tracing::debug!(matcher = "address", "matched map link");
        return Some(LinkMatch::AddressQuery(address));
    }
    None
}

/// `?q=lat,lng`, then `?ll=lat,lng`.
pub fn match_query_coords(input: &str) -> Option<ParsedLink> {
    [&*Q_PARAM, &*LL_PARAM].into_iter().find_map(|re| {
        let caps = re.captures(input)?;
        parse_pair(&caps[1], &caps[2]).map(ParsedLink::from)
    })
}

/// `/place/<name>/@lat,lng`, keeping the decoded place name.
pub fn match_place(input: &str) -> Option<ParsedLink> {
    let caps = PLACE_SEGMENT.captures(input)?;
    let coord = parse_pair(&caps[2], &caps[3])?;
    let name = decode_component(&caps[1]);
    Some(ParsedLink {
        lat: coord.lat,
        lng: coord.lng,
        address: if name.trim().is_empty() { None } else { Some(name) },
    })
}

/// `@lat,lng` anywhere in the path or fragment. Trailing zoom (`,15z`) is ignored.
pub fn match_at(input: &str) -> Option<ParsedLink> {
    let caps = AT_SEGMENT.captures(input)?;
    parse_pair(&caps[1], &caps[2]).map(ParsedLink::from)
}

/// True when the link's host is a known map-link shortener.
pub fn is_short_link(input: &str) -> bool {
    short_link_url(input).is_some()
}

/// The absolute URL to expand when `input` is on a shortener host.
pub fn short_link_url(input: &str) -> Option<String> {
    let url = lenient_url(input)?;
    let host = url.host_str()?.to_lowercase();
    SHORTENER_HOSTS
        .iter()
        .any(|s| host == *s || host.ends_with(&format!(".{s}")))
        .then(|| url.to_string())
}

/// `input` as an absolute URL, with `https://` assumed when the scheme is missing.
pub fn normalize_url(input: &str) -> Option<String> {
    lenient_url(input).map(String::from)
}

/// Decoded value of an `address=` query parameter.
pub fn match_address_param(input: &str) -> Option<String> {
    let caps = ADDRESS_PARAM.captures(input)?;
    let address = decode_component(&caps[1]);
    let address = address.trim();
    if address.is_empty() {
        None
    } else {
        Some(address.to_string())
    }
}

/// Lowercased host of a link, tolerating a missing scheme.
pub(crate) fn host_of(input: &str) -> Option<String> {
    lenient_url(input)?.host_str().map(str::to_lowercase)
}

fn lenient_url(input: &str) -> Option<Url> {
    let input = input.trim();
    Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()
}

/// Parse a matched numeric pair. Unparsable, non-finite or out-of-range values are no match.
fn parse_pair(lat: &str, lng: &str) -> Option<Coordinate> {
    let lat: f64 = lat.parse().ok()?;
    let lng: f64 = lng.parse().ok()?;
    Coordinate::new(lat, lng).ok()
}

/// Percent-decode a URL component, turning `+` into spaces.
fn decode_component(raw: &str) -> String {
    // form_urlencoded splits on raw '&' and '='; put them back so the component survives
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| if v.is_empty() { k.into_owned() } else { format!("{k}={v}") })
        .collect::<Vec<_>>()
        .join("&")
}
