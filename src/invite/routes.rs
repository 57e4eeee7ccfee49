use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::analytics::AnalyticsService;
use crate::api::handlers::health_check;

use super::handlers::{track_interaction, track_language, track_view, InviteState};
use super::middleware::record_request_timing;

/// Public, unauthenticated tracking endpoints called from invitation pages
pub fn create_invite_router(analytics: Arc<AnalyticsService>) -> Router {
    let state = Arc::new(InviteState { analytics });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/invite/{slug}/view", post(track_view))
        .route("/api/invite/{slug}/track-interaction", post(track_interaction))
        .route("/api/invite/{slug}/track-language", post(track_language))
        .layer(middleware::from_fn(record_request_timing))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
