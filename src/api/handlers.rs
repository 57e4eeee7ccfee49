use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analytics::{AnalyticsRecord, AnalyticsService, DateRange, Summary};

pub struct AppState {
    pub analytics: Arc<AnalyticsService>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub date_range: DateRange,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(context: &str, e: anyhow::Error) -> HandlerError {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: context.to_string(),
        }),
    )
}

/// Admin reads target existing profiles only
async fn ensure_profile(state: &AppState, profile_id: &str) -> Result<(), HandlerError> {
    match state.analytics.find_profile(profile_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Profile not found".to_string(),
            }),
        )),
        Err(e) => Err(internal_error("Failed to look up profile", e)),
    }
}

/// Get the full analytics aggregate for a profile
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
) -> Result<Json<AnalyticsRecord>, HandlerError> {
    ensure_profile(&state, &profile_id).await?;

    state
        .analytics
        .get_analytics(&profile_id)
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to retrieve analytics", e))
}

/// Get the date-range summary for a profile
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Summary>, HandlerError> {
    ensure_profile(&state, &profile_id).await?;

    state
        .analytics
        .get_summary(&profile_id, query.date_range, Utc::now())
        .await
        .map(Json)
        .map_err(|e| internal_error("Failed to retrieve analytics summary", e))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
