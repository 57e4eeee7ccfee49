use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::analytics::{AnalyticsService, DeviceType, InteractionType, LanguageCode};
use crate::api::ErrorResponse;
use crate::models::{Profile, ProfileStatus};

/// Longest accepted client session token
pub const MAX_SESSION_ID_LEN: usize = 128;

pub struct InviteState {
    pub analytics: Arc<AnalyticsService>,
}

#[derive(Debug, Deserialize)]
pub struct TrackViewRequest {
    pub device_type: DeviceType,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackInteractionRequest {
    pub interaction_type: InteractionType,
}

#[derive(Debug, Deserialize)]
pub struct TrackLanguageRequest {
    pub language_code: LanguageCode,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: &str) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Resolve the slug to a live profile or the matching error response
async fn live_profile(state: &InviteState, slug: &str) -> Result<Profile, HandlerError> {
    match state.analytics.resolve_slug(slug, Utc::now()).await {
        Ok(ProfileStatus::Live(profile)) => Ok(profile),
        Ok(ProfileStatus::Gone) => Err(error(
            StatusCode::GONE,
            "This invitation link has expired",
        )),
        Ok(ProfileStatus::NotFound) => Err(error(StatusCode::NOT_FOUND, "Invitation not found")),
        Err(e) => {
            tracing::error!(slug, error = %e, "failed to resolve invitation slug");
            Err(error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
    }
}

/// Record an invitation page view
pub async fn track_view(
    State(state): State<Arc<InviteState>>,
    Path(slug): Path<String>,
    Json(payload): Json<TrackViewRequest>,
) -> Result<StatusCode, HandlerError> {
    let session_id = payload
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if session_id.is_some_and(|s| s.len() > MAX_SESSION_ID_LEN) {
        return Err(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "session_id is too long",
        ));
    }

    let profile = live_profile(&state, &slug).await?;
    state
        .analytics
        .track_view(&profile.id, session_id, payload.device_type, Utc::now())
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Record a guest interaction (map, RSVP, music controls)
pub async fn track_interaction(
    State(state): State<Arc<InviteState>>,
    Path(slug): Path<String>,
    Json(payload): Json<TrackInteractionRequest>,
) -> Result<StatusCode, HandlerError> {
    let profile = live_profile(&state, &slug).await?;
    state
        .analytics
        .track_interaction(&profile.id, payload.interaction_type, Utc::now())
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Record which language the invitation was read in
pub async fn track_language(
    State(state): State<Arc<InviteState>>,
    Path(slug): Path<String>,
    Json(payload): Json<TrackLanguageRequest>,
) -> Result<StatusCode, HandlerError> {
    let profile = live_profile(&state, &slug).await?;
    state
        .analytics
        .track_language(&profile.id, payload.language_code, Utc::now())
        .await;

    Ok(StatusCode::NO_CONTENT)
}
