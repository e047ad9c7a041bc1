//! Router-level tests for the HTTP surface: status-code mapping, admin
//! guard, and the JSON shapes handlers return.

mod common;

use axum::body::Body;
use axum::Router;
use common::{yt, StubResolver, VIDEO_A, VIDEO_B};
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use jukeq_api::api::{create_router, AppContext};
use jukeq_api::sse::EventBus;
use jukeq_common::config::Config;
use jukeq_common::db::init_database;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_router(admin_token: Option<&str>) -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = init_database(&dir.path().join("jukeq.db"))
        .await
        .expect("database init");

    let mut config = Config::default();
    config.server.admin_token = admin_token.map(str::to_string);

    let ctx = AppContext::new(db, EventBus::new(64), &config, Arc::new(StubResolver));
    (create_router(ctx), dir)
}

async fn request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json_body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_module() {
    let (app, _dir) = test_router(None).await;
    let (status, body) = request(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "jukeq-api");
}

#[tokio::test]
async fn session_is_null_before_start() {
    let (app, _dir) = test_router(None).await;
    let (status, body) = request(&app, Method::GET, "/api/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session"].is_null());
}

#[tokio::test]
async fn admin_routes_require_bearer_token() {
    let (app, _dir) = test_router(Some("hunter2")).await;

    let (status, _) = request(&app, Method::POST, "/api/session/start", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        request(&app, Method::POST, "/api/session/start", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        request(&app, Method::POST, "/api/session/start", None, Some("hunter2")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["session"]["active"], true);
}

#[tokio::test]
async fn unset_token_disables_admin_guard() {
    let (app, _dir) = test_router(None).await;
    let (status, _) = request(&app, Method::POST, "/api/session/start", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn submit_without_session_is_404() {
    let (app, _dir) = test_router(None).await;
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/songs",
        Some(json!({ "url": yt(VIDEO_A), "username": "alice" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn unresolvable_url_is_400() {
    let (app, _dir) = test_router(None).await;
    request(&app, Method::POST, "/api/session/start", None, None).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/songs",
        Some(json!({ "url": "https://example.com/not-a-video", "username": "alice" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn bad_message_is_422_with_reason() {
    let (app, _dir) = test_router(None).await;
    request(&app, Method::POST, "/api/session/start", None, None).await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/songs",
        Some(json!({ "url": yt(VIDEO_A), "message": "!!!!!!", "username": "alice" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_message");
    assert!(body["message"].as_str().unwrap().contains("special"));
}

#[tokio::test]
async fn vote_on_unknown_song_is_404() {
    let (app, _dir) = test_router(None).await;
    request(&app, Method::POST, "/api/session/start", None, None).await;

    let path = format!("/api/songs/{}/vote", uuid::Uuid::new_v4());
    let (status, body) = request(
        &app,
        Method::POST,
        &path,
        Some(json!({ "username": "bob", "direction": "up" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn duplicate_submission_is_409() {
    let (app, _dir) = test_router(None).await;
    request(&app, Method::POST, "/api/session/start", None, None).await;

    let submit = json!({ "url": yt(VIDEO_A), "username": "alice" });
    let (status, _) = request(&app, Method::POST, "/api/songs", Some(submit.clone()), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(&app, Method::POST, "/api/songs", Some(submit), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn full_flow_over_http() {
    let (app, _dir) = test_router(None).await;

    let (status, _) = request(&app, Method::POST, "/api/session/start", None, None).await;
    assert_eq!(status, StatusCode::CREATED);

    // Submit two songs
    let (status, body_a) = request(
        &app,
        Method::POST,
        "/api/songs",
        Some(json!({ "url": yt(VIDEO_A), "message": "for the team", "username": "alice" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let song_a = body_a["song"]["guid"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/songs",
        Some(json!({ "url": yt(VIDEO_B), "username": "bob" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Vote song A up
    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/api/songs/{}/vote", song_a),
        Some(json!({ "username": "carol", "direction": "up" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["song"]["score"], 1);

    // Ranked playlist: A leads
    let (status, body) = request(&app, Method::GET, "/api/playlist", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let playlist = body["playlist"].as_array().unwrap();
    assert_eq!(playlist.len(), 2);
    assert_eq!(playlist[0]["guid"], song_a.as_str());

    // Current selects A and pins it
    let (status, body) = request(&app, Method::GET, "/api/playback/current", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current"]["guid"], song_a.as_str());
    assert_eq!(body["current"]["playing"], true);

    // Mark A played: B auto-selected
    let (status, body) = request(
        &app,
        Method::POST,
        &format!("/api/songs/{}/played", song_a),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"]["played"], true);
    assert_eq!(body["next"]["playing"], true);

    // A never reappears
    let (_, body) = request(&app, Method::GET, "/api/playlist", None, None).await;
    let playlist = body["playlist"].as_array().unwrap();
    assert!(playlist.iter().all(|s| s["guid"] != song_a.as_str()));

    // End session: playlist view now 404s
    let (status, _) = request(&app, Method::POST, "/api/session/end", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(&app, Method::GET, "/api/playlist", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ending_without_session_is_404() {
    let (app, _dir) = test_router(None).await;
    let (status, body) = request(&app, Method::POST, "/api/session/end", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
