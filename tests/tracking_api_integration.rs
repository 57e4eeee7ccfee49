//! End-to-end tests for the public tracking endpoints and the admin
//! analytics endpoints

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use invite_analytics::analytics::AnalyticsService;
use invite_analytics::api::create_api_router;
use invite_analytics::auth::AuthService;
use invite_analytics::config::AuthConfig;
use invite_analytics::invite::create_invite_router;
use invite_analytics::models::Profile;
use invite_analytics::storage::{MemoryStorage, Storage};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

struct TestApp {
    invite: Router,
    admin: Router,
}

async fn create_test_app() -> TestApp {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    storage.init().await.unwrap();

    storage
        .put_profile(&Profile::new("p1", "asha-weds-ravi"))
        .await
        .unwrap();

    let mut expired = Profile::new("p2", "old-wedding");
    expired.expires_at = Some(Utc::now() - Duration::days(1));
    storage.put_profile(&expired).await.unwrap();

    let mut inactive = Profile::new("p3", "cancelled");
    inactive.is_active = false;
    storage.put_profile(&inactive).await.unwrap();

    let analytics = Arc::new(AnalyticsService::new(storage));
    let auth = Arc::new(AuthService::new(&AuthConfig {
        enabled: true,
        api_keys: vec![ADMIN_KEY.to_string()],
    }));

    TestApp {
        invite: create_invite_router(Arc::clone(&analytics)),
        admin: create_api_router(analytics, auth),
    }
}

async fn post_json(router: &Router, uri: &str, body: Value) -> StatusCode {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

async fn admin_get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("X-API-Key", ADMIN_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn view(app: &TestApp, session_id: &str, device: &str) -> StatusCode {
    post_json(
        &app.invite,
        "/api/invite/asha-weds-ravi/view",
        json!({ "device_type": device, "session_id": session_id }),
    )
    .await
}

#[tokio::test]
async fn test_track_view_returns_no_content() {
    let app = create_test_app().await;

    assert_eq!(view(&app, "s1", "mobile").await, StatusCode::NO_CONTENT);

    let (status, record) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["total_views"], 1);
    assert_eq!(record["unique_views"], 1);
    assert_eq!(record["mobile_views"], 1);
}

#[tokio::test]
async fn test_repeat_session_counts_once_as_unique() {
    let app = create_test_app().await;

    view(&app, "s1", "mobile").await;
    view(&app, "s1", "mobile").await;

    let (_, record) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics").await;
    assert_eq!(record["total_views"], 2);
    assert_eq!(record["unique_views"], 1);
    assert_eq!(record["mobile_views"], 2);
}

#[tokio::test]
async fn test_device_breakdown_in_summary() {
    let app = create_test_app().await;

    view(&app, "s1", "mobile").await;
    view(&app, "s2", "desktop").await;
    view(&app, "s3", "tablet").await;

    let (status, summary) = admin_get(
        &app.admin,
        "/api/admin/profiles/p1/analytics/summary?date_range=7d",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["date_range"], "7d");
    assert_eq!(summary["total_views"], 3);
    assert_eq!(summary["unique_visitors"], 3);
    assert_eq!(
        summary["device_breakdown"],
        json!({ "mobile": 1, "desktop": 1, "tablet": 1 })
    );
}

#[tokio::test]
async fn test_view_without_session_is_not_unique() {
    let app = create_test_app().await;

    let status = post_json(
        &app.invite,
        "/api/invite/asha-weds-ravi/view",
        json!({ "device_type": "desktop" }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, record) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics").await;
    assert_eq!(record["total_views"], 1);
    assert_eq!(record["unique_views"], 0);
}

#[tokio::test]
async fn test_never_viewed_profile_has_zeroed_analytics() {
    let app = create_test_app().await;

    let (status, record) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["total_views"], 0);
    assert_eq!(record["unique_views"], 0);
    assert_eq!(record["first_viewed_at"], Value::Null);
    assert_eq!(record["last_viewed_at"], Value::Null);
    assert_eq!(record["daily_views"], json!([]));
    assert_eq!(record["hourly_distribution"], json!({}));
    assert_eq!(record["language_views"], json!({}));

    let (status, summary) =
        admin_get(&app.admin, "/api/admin/profiles/p1/analytics/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["date_range"], "all");
    assert_eq!(summary["total_views"], 0);
    assert_eq!(summary["most_viewed_language"], Value::Null);
    assert_eq!(summary["peak_hour"], Value::Null);
}

#[tokio::test]
async fn test_most_viewed_language() {
    let app = create_test_app().await;
    view(&app, "s1", "mobile").await;

    for (language, times) in [("telugu", 5), ("english", 3)] {
        for _ in 0..times {
            let status = post_json(
                &app.invite,
                "/api/invite/asha-weds-ravi/track-language",
                json!({ "language_code": language }),
            )
            .await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }
    }

    let (_, summary) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics/summary").await;
    assert_eq!(summary["most_viewed_language"], "telugu");

    let (_, record) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics").await;
    assert_eq!(record["language_views"], json!({ "english": 3, "telugu": 5 }));
}

#[tokio::test]
async fn test_interaction_counters() {
    let app = create_test_app().await;
    view(&app, "s1", "mobile").await;

    for interaction in ["map_click", "map_click", "rsvp_click"] {
        let status = post_json(
            &app.invite,
            "/api/invite/asha-weds-ravi/track-interaction",
            json!({ "interaction_type": interaction }),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, record) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics").await;
    assert_eq!(record["map_clicks"], 2);
    assert_eq!(record["rsvp_clicks"], 1);
    assert_eq!(record["music_plays"], 0);
    assert_eq!(record["music_pauses"], 0);
}

#[tokio::test]
async fn test_interaction_before_any_view_is_accepted_but_ignored() {
    let app = create_test_app().await;

    let status = post_json(
        &app.invite,
        "/api/invite/asha-weds-ravi/track-interaction",
        json!({ "interaction_type": "music_play" }),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, record) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics").await;
    assert_eq!(record["music_plays"], 0);
}

#[tokio::test]
async fn test_unknown_slug_is_not_found() {
    let app = create_test_app().await;

    let status = post_json(
        &app.invite,
        "/api/invite/no-such-wedding/view",
        json!({ "device_type": "mobile", "session_id": "s1" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_and_inactive_links_are_gone() {
    let app = create_test_app().await;

    for slug in ["old-wedding", "cancelled"] {
        let status = post_json(
            &app.invite,
            &format!("/api/invite/{slug}/view"),
            json!({ "device_type": "mobile", "session_id": "s1" }),
        )
        .await;
        assert_eq!(status, StatusCode::GONE, "slug {slug}");

        let status = post_json(
            &app.invite,
            &format!("/api/invite/{slug}/track-language"),
            json!({ "language_code": "hindi" }),
        )
        .await;
        assert_eq!(status, StatusCode::GONE, "slug {slug}");
    }

    let (_, record) = admin_get(&app.admin, "/api/admin/profiles/p2/analytics").await;
    assert_eq!(record["total_views"], 0);
}

#[tokio::test]
async fn test_invalid_enum_values_are_rejected() {
    let app = create_test_app().await;

    let cases = [
        (
            "/api/invite/asha-weds-ravi/view",
            json!({ "device_type": "smart_tv", "session_id": "s1" }),
        ),
        (
            "/api/invite/asha-weds-ravi/track-interaction",
            json!({ "interaction_type": "share_click" }),
        ),
        (
            "/api/invite/asha-weds-ravi/track-language",
            json!({ "language_code": "french" }),
        ),
    ];

    for (uri, body) in cases {
        assert_eq!(
            post_json(&app.invite, uri, body).await,
            StatusCode::UNPROCESSABLE_ENTITY,
            "{uri}"
        );
    }

    let (_, record) = admin_get(&app.admin, "/api/admin/profiles/p1/analytics").await;
    assert_eq!(record["total_views"], 0);
}

#[tokio::test]
async fn test_oversized_session_id_is_rejected() {
    let app = create_test_app().await;

    let status = view(&app, &"x".repeat(129), "mobile").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_admin_requires_api_key() {
    let app = create_test_app().await;

    let response = app
        .admin
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/profiles/p1/analytics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .admin
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/profiles/p1/analytics/summary")
                .header(header::AUTHORIZATION, "Bearer wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .admin
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/profiles/p1/analytics")
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_unknown_profile_and_bad_range() {
    let app = create_test_app().await;

    let (status, body) = admin_get(&app.admin, "/api/admin/profiles/ghost/analytics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Profile not found");

    let (status, _) = admin_get(
        &app.admin,
        "/api/admin/profiles/p1/analytics/summary?date_range=90d",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_timing_header() {
    let app = create_test_app().await;

    let response = app
        .invite
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-invite-timing-ms"));

    let response = app
        .admin
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
