use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            // Listed outermost first; the request id is set before the trace span reads it
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// Query routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::get_stats))
        .route("/genres", get(handlers::get_genres))
        .route("/movies/similar", get(handlers::similar_movies))
        .route("/movies/by-genre", get(handlers::movies_by_genre))
        .route("/movies/popular", get(handlers::popular_movies))
}
