use std::sync::Arc;

use crate::maplink::{MapLinkResolver, Transport};

/// Resolver over a type-erased transport so tests can swap in canned responses.
pub type SharedResolver = MapLinkResolver<Arc<dyn Transport>>;

pub struct AppState {
    pub resolver: SharedResolver,
}
