use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::maplink::{
    generate_maps_link, incoming_map_url, is_map_link, validate_coordinate_strs, Coordinate,
    LinkError, ParsedLink, SiteLocation,
};

use super::state::{AppState, SharedResolver};

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

impl From<LinkError> for ApiError {
    fn from(e: LinkError) -> Self {
        let status = match e {
            LinkError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LinkError::UnrecognizedFormat => StatusCode::UNPROCESSABLE_ENTITY,
            LinkError::NotFound(_) => StatusCode::NOT_FOUND,
            LinkError::Transport(_) | LinkError::ShortLinkExpansion => StatusCode::BAD_GATEWAY,
        };
        ApiError(status, e.reason())
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

/// Run a blocking resolver call off the async runtime.
async fn run_blocking<R, F>(state: &Arc<AppState>, f: F) -> Result<R, ApiError>
where
    F: FnOnce(&SharedResolver) -> R + Send + 'static,
    R: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.resolver))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("resolver task failed: {}", e)))
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(api_error(StatusCode::BAD_REQUEST, format!("Missing '{}' parameter", name))),
    }
}

fn required_coords(params: CoordQuery) -> Result<(f64, f64), ApiError> {
    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lng' parameters"));
    };
    let number = |name: &str, raw: &str| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, format!("'{}' is not a number", name)))
    };
    Ok((number("lat", &lat)?, number("lng", &lng)?))
}

// ─── Query shapes ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LinkQuery {
    pub link: Option<String>,
}

#[derive(Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}

#[derive(Deserialize)]
pub struct AddressQuery {
    pub address: Option<String>,
}

/// Raw values, so non-numeric input gets an `ApiError` body rather than the extractor's plain-text 400.
#[derive(Deserialize)]
pub struct CoordQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct AddressResponse {
    pub address: String,
}

#[derive(Serialize, Debug)]
pub struct MapsLinkResponse {
    pub maps_link: String,
}

#[derive(Serialize, Debug)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct DeepLinkResponse {
    pub map_url: Option<String>,
    pub is_map_link: bool,
}

// ─── GET /api/parse ──────────────────────────────────────────────

pub async fn parse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LinkQuery>,
) -> Result<Json<ParsedLink>, ApiError> {
    let start = Instant::now();
    let link = required(params.link, "link")?;

    let result = run_blocking(&state, move |r| r.parse_map_link(&link)).await?;

    tracing::info!(
        ok = result.is_ok(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/parse"
    );
    Ok(Json(result?))
}

// ─── GET /api/expand ─────────────────────────────────────────────

pub async fn expand(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UrlQuery>,
) -> Result<Json<ParsedLink>, ApiError> {
    let url = required(params.url, "url")?;
    let result = run_blocking(&state, move |r| r.expand_short_link(&url)).await?;
    Ok(Json(result?))
}

// ─── GET /api/geocode ────────────────────────────────────────────

pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressQuery>,
) -> Result<Json<Coordinate>, ApiError> {
    let start = Instant::now();
    let address = required(params.address, "address")?;

    let result = run_blocking(&state, move |r| r.geocode_address(&address)).await?;

    tracing::info!(
        ok = result.is_ok(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/geocode"
    );
    Ok(Json(result?))
}

// ─── GET /api/reverse ────────────────────────────────────────────

pub async fn reverse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CoordQuery>,
) -> Result<Json<AddressResponse>, ApiError> {
    let (lat, lng) = required_coords(params)?;
    let address = run_blocking(&state, move |r| r.reverse_geocode(lat, lng)).await??;
    Ok(Json(AddressResponse { address }))
}

// ─── GET /api/link ───────────────────────────────────────────────

pub async fn maps_link(Query(params): Query<CoordQuery>) -> Result<Json<MapsLinkResponse>, ApiError> {
    let (lat, lng) = required_coords(params)?;
    Ok(Json(MapsLinkResponse {
        maps_link: generate_maps_link(lat, lng),
    }))
}

// ─── GET /api/validate ───────────────────────────────────────────

pub async fn validate(Query(params): Query<CoordQuery>) -> Json<ValidationResponse> {
    let lat = params.lat.unwrap_or_default();
    let lng = params.lng.unwrap_or_default();
    Json(match validate_coordinate_strs(&lat, &lng) {
        Ok(_) => ValidationResponse { valid: true, error: None },
        Err(e) => ValidationResponse { valid: false, error: Some(e.to_string()) },
    })
}

// ─── GET /api/site ───────────────────────────────────────────────

pub async fn site(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LinkQuery>,
) -> Result<Json<SiteLocation>, ApiError> {
    let link = required(params.link, "link")?;
    let site = run_blocking(&state, move |r| r.resolve_site_location(&link)).await??;
    Ok(Json(site))
}

// ─── GET /api/deeplink ───────────────────────────────────────────

pub async fn deeplink(Query(params): Query<UrlQuery>) -> Result<Json<DeepLinkResponse>, ApiError> {
    let app_url = required(params.url, "url")?;
    let map_url = incoming_map_url(&app_url);
    let is_map = map_url.as_deref().map(is_map_link).unwrap_or(false);
    Ok(Json(DeepLinkResponse {
        map_url,
        is_map_link: is_map,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::maplink::test_utils::FakeTransport;
    use crate::maplink::{MapLinkResolver, Transport};
    use serde_json::json;

    fn state_with(fake: FakeTransport) -> State<Arc<AppState>> {
        let transport: Arc<dyn Transport> = Arc::new(fake);
        let resolver = MapLinkResolver::with_transport(ResolverConfig::default(), transport);
        State(Arc::new(AppState { resolver }))
    }

    fn link_query(link: &str) -> Query<LinkQuery> {
        Query(LinkQuery { link: Some(link.to_string()) })
    }

    #[tokio::test]
    async fn test_parse_ok() {
        let Json(link) = parse(state_with(FakeTransport::new()), link_query("https://maps.google.com/?q=46.0569,13.2348"))
            .await
            .unwrap();
        assert_eq!(link.lat, 46.0569);
        assert_eq!(link.lng, 13.2348);
    }

    #[tokio::test]
    async fn test_parse_missing_param() {
        let err = parse(state_with(FakeTransport::new()), Query(LinkQuery { link: None }))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_parse_unrecognized_is_422() {
        let err = parse(state_with(FakeTransport::new()), link_query("https://example.com/"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.1, "unrecognized link format");
    }

    #[tokio::test]
    async fn test_expand_failure_is_502() {
        let err = expand(
            state_with(FakeTransport::failing()),
            Query(UrlQuery { url: Some("https://maps.app.goo.gl/x".into()) }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_geocode_not_found_is_404() {
        let err = geocode(
            state_with(FakeTransport::new().with_json("/search", json!([]))),
            Query(AddressQuery { address: Some("Via Inesistente".into()) }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert_eq!(err.1, "address not found");
    }

    #[tokio::test]
    async fn test_reverse_ok() {
        let Json(resp) = reverse(
            state_with(FakeTransport::new().with_json("/reverse", json!({ "display_name": "Udine" }))),
            Query(CoordQuery { lat: Some("46.06".into()), lng: Some("13.24".into()) }),
        )
        .await
        .unwrap();
        assert_eq!(resp.address, "Udine");
    }

    #[tokio::test]
    async fn test_maps_link() {
        let Json(resp) = maps_link(Query(CoordQuery { lat: Some("46.05".into()), lng: Some("13.23".into()) }))
            .await
            .unwrap();
        assert_eq!(resp.maps_link, generate_maps_link(46.05, 13.23));
        assert!(maps_link(Query(CoordQuery { lat: None, lng: Some("1.0".into()) })).await.is_err());
    }

    #[tokio::test]
    async fn test_non_numeric_coords_are_api_errors() {
        let err = maps_link(Query(CoordQuery { lat: Some("abc".into()), lng: Some("13.23".into()) }))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1, "'lat' is not a number");

        let fake = FakeTransport::new();
        let err = reverse(
            state_with(fake),
            Query(CoordQuery { lat: Some("46.06".into()), lng: Some("NaN".into()) }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1, "'lng' is not a number");

        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "error": "'lng' is not a number", "code": 400 }));
    }

    #[tokio::test]
    async fn test_validate() {
        let Json(ok) = validate(Query(CoordQuery { lat: Some("45".into()), lng: Some("10".into()) })).await;
        assert!(ok.valid);
        assert!(ok.error.is_none());

        let Json(bad) = validate(Query(CoordQuery { lat: Some("91".into()), lng: Some("0".into()) })).await;
        assert!(!bad.valid);
        assert!(bad.error.unwrap().contains("latitude"));

        let Json(nan) = validate(Query(CoordQuery { lat: Some("abc".into()), lng: None })).await;
        assert_eq!(nan.error.as_deref(), Some("coordinates are not numeric"));
    }

    #[tokio::test]
    async fn test_site() {
        let fake = FakeTransport::new().with_json("/reverse", json!({ "display_name": "Via Roma 1, Udine" }));
        let Json(resolved) = site(state_with(fake), link_query("https://maps.google.com/?q=46.05,13.23"))
            .await
            .unwrap();
        assert_eq!(resolved.address.as_deref(), Some("Via Roma 1, Udine"));
    }

    #[tokio::test]
    async fn test_deeplink() {
        let Json(resp) = deeplink(Query(UrlQuery {
            url: Some("https://cantieri.example.com/?map=https%3A%2F%2Fmaps.app.goo.gl%2Fabc".into()),
        }))
        .await
        .unwrap();
        assert_eq!(resp.map_url.as_deref(), Some("https://maps.app.goo.gl/abc"));
        assert!(resp.is_map_link);
    }
}
