mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use state::{AppState, SharedResolver};

use crate::config::ResolverConfig;
use crate::maplink::{MapLinkResolver, Transport, UreqTransport};

/// Resolver backed by the real HTTP transport.
pub fn default_resolver(config: ResolverConfig) -> SharedResolver {
    let transport: Arc<dyn Transport> = Arc::new(UreqTransport::new(&config));
    MapLinkResolver::with_transport(config, transport)
}

pub fn build_router(resolver: SharedResolver) -> Router {
    let state = Arc::new(AppState { resolver });

    Router::new()
        .route("/api/parse", get(handlers::parse))
        .route("/api/expand", get(handlers::expand))
        .route("/api/geocode", get(handlers::geocode))
        .route("/api/reverse", get(handlers::reverse))
        .route("/api/link", get(handlers::maps_link))
        .route("/api/validate", get(handlers::validate))
        .route("/api/site", get(handlers::site))
        .route("/api/deeplink", get(handlers::deeplink))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, resolver: SharedResolver) -> std::io::Result<()> {
    let app = build_router(resolver);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "cantiere map-link server listening");
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await
}
