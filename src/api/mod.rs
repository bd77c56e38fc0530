//! HTTP surface: axum router over the recommendation service.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::RecommendationService;

/// Shared application context passed to all handlers.
#[derive(Clone)]
pub struct AppContext {
    pub service: Arc<RecommendationService>,
}

/// Build the router with all routes.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/recommendations", post(handlers::generate))
        .route("/api/sessions/:session_id", get(handlers::get_session))
        .route(
            "/api/sessions/:session_id/rating",
            post(handlers::submit_rating),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
