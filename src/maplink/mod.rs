//! Map-link resolution for site records.
//!
//! Parses Google/Apple Maps links into coordinates, expands short links,
//! forward/reverse geocodes via Nominatim, and builds navigation links.

pub mod matchers;
pub mod navigation;
pub mod providers;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use navigation::{
    format_coords, generate_maps_link, incoming_map_url, is_map_link, validate_coordinate_strs,
    validate_coordinates,
};
pub use providers::{Transport, UreqTransport};
pub use resolver::MapLinkResolver;
pub use types::{Coordinate, CoordinateError, LinkError, LinkParseResult, ParsedLink, SiteLocation};
