use crate::metrics;
use crate::service::CatalogService;
use axum::http::{HeaderValue, StatusCode};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use catalog_core::{CatalogError, FilterCriteria, ProductParams};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

/// HTTP face of [`CatalogError`].
pub struct ApiError(pub CatalogError);

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            CatalogError::InvalidId(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": self.0.to_string()})),
            )
                .into_response(),
            CatalogError::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"message": "Service Unavailable"})),
            )
                .into_response(),
            CatalogError::QueryFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "Internal Server Error"})),
            )
                .into_response(),
        }
    }
}

pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(o) => layer.allow_origin(o),
        None => layer.allow_origin(Any),
    }
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/all-products", get(all_products))
        .route("/products", get(products))
        .route("/products-details", get(product_details))
        .route("/admin/explain", get(explain))
        .route("/metrics", get(metrics_text))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn all_products(State(app): State<AppState>) -> Result<Response, ApiError> {
    let items = app.catalog.list_all().await?;
    Ok((StatusCode::OK, Json(items)).into_response())
}

async fn products(
    State(app): State<AppState>,
    Query(params): Query<ProductParams>,
) -> Result<Response, ApiError> {
    let criteria = FilterCriteria::from_params(&params);
    let items = app.catalog.search(&criteria).await?;
    Ok((StatusCode::OK, Json(items)).into_response())
}

#[derive(Deserialize)]
struct DetailsQuery {
    id: Option<String>,
}

async fn product_details(
    State(app): State<AppState>,
    Query(q): Query<DetailsQuery>,
) -> Result<Response, ApiError> {
    let id = q
        .id
        .ok_or_else(|| CatalogError::InvalidId("missing id".into()))?;
    match app.catalog.get_by_id(&id).await? {
        Some(item) => Ok((StatusCode::OK, Json(item)).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "item not found"})),
        )
            .into_response()),
    }
}

async fn explain(
    State(app): State<AppState>,
    Query(params): Query<ProductParams>,
) -> impl IntoResponse {
    let criteria = FilterCriteria::from_params(&params);
    let pipeline = app.catalog.explain(&criteria);
    let resp = json!({
        "criteria": criteria,
        "fingerprint": pipeline.fingerprint(),
        "stages": pipeline.stages(),
        "store": app.catalog.store().describe(),
    });
    (StatusCode::OK, Json(resp))
}

async fn metrics_text() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
