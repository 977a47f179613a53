// Integration tests for the HTTP control surface
//
// The router is exercised end to end with tower's oneshot against
// stubbed SDKs and a temp-dir backup store.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::Engine;
use common::*;
use serde_json::{json, Value};
use speaklab::backup::{BackupDispatcher, LocalFallbackStore};
use speaklab::http::{create_router, AppState};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_state(temp_dir: &TempDir) -> AppState {
    let client = build_client(
        StubSpeechToText::new(
            SdkBehavior::Modern,
            &["안녕하세요 저는 민수예요", "안녕하십니까 저는 민수예요"],
        ),
        StubLanguageFeedback::new(SdkBehavior::Modern),
        StubSpeechSynthesis::new(SdkBehavior::Modern),
    );
    let dispatcher = Arc::new(BackupDispatcher::new(
        None,
        LocalFallbackStore::new(temp_dir.path()),
        test_policy(),
    ));
    AppState::new(client, dispatcher, QUESTION.to_string(), test_limits())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

fn recording_body() -> Value {
    let audio = base64::engine::general_purpose::STANDARD.encode(recording().bytes);
    json!({
        "audio": audio,
        "format": "wav",
        "duration_secs": 65.0,
    })
}

#[tokio::test]
async fn health_check_works() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn second_start_while_session_live_conflicts() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir));

    let response = app
        .clone()
        .oneshot(post_json("/sessions", json!({ "participant_id": "Student01" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json("/sessions", json!({ "participant_id": "Student02" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir));

    let response = app
        .oneshot(get("/sessions/session-does-not-exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_session_over_http_completes_with_local_backup() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir));

    // Start
    let response = app
        .clone()
        .oneshot(post_json("/sessions", json!({ "participant_id": "Student01" })))
        .await
        .unwrap();
    let started = body_json(response).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    // Attempt 1
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/sessions/{}/recordings", session_id),
            recording_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let submitted = body_json(response).await;
    assert_eq!(submitted["attempt"], 1);
    assert_eq!(
        submitted["view"]["attempts"][0]["status"],
        "synthesized"
    );

    let response = app
        .clone()
        .oneshot(post_json(&format!("/sessions/{}/advance", session_id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Comparison is not available yet.
    let response = app
        .clone()
        .oneshot(get(&format!("/sessions/{}/comparison", session_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Attempt 2
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/sessions/{}/recordings", session_id),
            recording_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(&format!("/sessions/{}/advance", session_id), json!({})))
        .await
        .unwrap();
    let advanced = body_json(response).await;
    assert_eq!(advanced["status"], "completed");

    // Comparison now reports both transcripts and a non-empty diff.
    let response = app
        .clone()
        .oneshot(get(&format!("/sessions/{}/comparison", session_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let comparison = body_json(response).await;
    assert_eq!(comparison["first_transcript"], "안녕하세요 저는 민수예요");
    assert_eq!(comparison["second_transcript"], "안녕하십니까 저는 민수예요");
    assert!(!comparison["diff"].as_array().unwrap().is_empty());

    // Complete: remote is disabled, so the bundle lands in local fallback.
    let response = app
        .clone()
        .oneshot(post_json(&format!("/sessions/{}/complete", session_id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let completed = body_json(response).await;
    assert_eq!(completed["status"], "completed_local_only");

    let bundles: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
    assert_eq!(bundles.len(), 1, "exactly one bundle written");
}

#[tokio::test]
async fn invalid_base64_audio_is_bad_request() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir));

    let response = app
        .clone()
        .oneshot(post_json("/sessions", json!({})))
        .await
        .unwrap();
    let started = body_json(response).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(post_json(
            &format!("/sessions/{}/recordings", session_id),
            json!({ "audio": "not-base64!!", "format": "wav", "duration_secs": 10.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn abandon_ends_the_session() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir));

    let response = app
        .clone()
        .oneshot(post_json("/sessions", json!({ "participant_id": "Student01" })))
        .await
        .unwrap();
    let started = body_json(response).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_json(&format!("/sessions/{}/abandon", session_id), json!({})))
        .await
        .unwrap();
    let abandoned = body_json(response).await;
    assert_eq!(abandoned["status"], "abandoned");

    // A new session can start once the previous one is terminal.
    let response = app
        .oneshot(post_json("/sessions", json!({ "participant_id": "Student02" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
