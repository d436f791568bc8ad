use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

pub mod handlers;
pub mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/images", get(handlers::list_images))
        .route("/images/:image_id/similar", get(handlers::similar_images))
        .route("/preferences", post(handlers::record_preference))
        .route("/views", post(handlers::record_view_time))
        .route("/users/:user_id/preferences", get(handlers::user_preferences))
        .route("/users/:user_id/categories", get(handlers::user_categories))
        .route("/users/:user_id/views", get(handlers::user_views))
        .route("/users/:user_id/insights", get(handlers::user_insights))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Tags each request's span with a generated id for log correlation
fn make_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %Uuid::new_v4(),
    )
}
