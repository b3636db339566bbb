//! Cantiere Maps: map-link resolution for construction-site records.
//!
//! Turns whatever a user pastes into a site form (Google/Apple Maps links,
//! short links, address links) into coordinates, and back into addresses
//! and driving-directions links.

pub mod config;
pub mod maplink;
pub mod server;
