use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::{self, Next},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::analytics::AnalyticsService;
use crate::auth::{auth_middleware, AuthService};

use super::handlers::{get_analytics, get_summary, health_check, AppState};

/// Admin analytics endpoints, gated by the API-key middleware
pub fn create_api_router(analytics: Arc<AnalyticsService>, auth_service: Arc<AuthService>) -> Router {
    let state = Arc::new(AppState { analytics });

    let protected_routes = Router::new()
        .route("/api/admin/profiles/{profile_id}/analytics", get(get_analytics))
        .route(
            "/api/admin/profiles/{profile_id}/analytics/summary",
            get(get_summary),
        )
        .route_layer(middleware::from_fn(move |headers: HeaderMap, req: Request, next: Next| {
            let auth = Arc::clone(&auth_service);
            auth_middleware(auth, headers, req, next)
        }))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
}
