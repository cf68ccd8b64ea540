use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Photo upload -> detection + recommendations
        .route("/detect", post(handlers::detect))
        // Recommendations by food name
        .route("/recommend/:food_name", get(handlers::recommend))
        // Outermost first: the request ID must exist before the trace span is made
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Browser clients are served from other origins
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
