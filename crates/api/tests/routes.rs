//! In-process HTTP tests for the API routes.

use std::sync::Arc;

use api::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use database::Database;
use safety_core::{Engine, EngineConfig, ManualClock, PushEventKind, RecordingSink};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    sink: Arc<RecordingSink>,
}

async fn test_app() -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
    ));
    let sink = Arc::new(RecordingSink::new());
    let engine = Engine::new(db, EngineConfig::default(), clock, sink.clone());

    TestApp {
        router: api::app(AppState::new(engine)),
        sink,
    }
}

impl TestApp {
    async fn call(&self, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register users and make them accepted friends.
    async fn befriend(&self, initiator: &str, counterpart: &str) -> String {
        self.call("GET", "/me", Some(counterpart), None).await;
        let (status, request) = self
            .call(
                "POST",
                "/friends/requests",
                Some(initiator),
                Some(json!({ "to_user_id": counterpart })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let id = request["id"].as_str().unwrap().to_string();
        let (status, _) = self
            .call(
                "PATCH",
                &format!("/friends/requests/{id}"),
                Some(counterpart),
                Some(json!({ "action": "accept" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        id
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = test_app().await;
    let (status, body) = app.call("GET", "/friends", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_first_request_registers_user() {
    let app = test_app().await;
    let (status, body) = app.call("GET", "/me", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "alice");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["status"], "available");

    let (status, body) = app
        .call("PATCH", "/me/status", Some("alice"), Some(json!({ "status": "driving" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "driving");
}

#[tokio::test]
async fn test_error_codes_map_to_statuses() {
    let app = test_app().await;
    app.call("GET", "/me", Some("bob"), None).await;

    let (status, body) = app
        .call("POST", "/friends/requests", Some("alice"), Some(json!({ "to_user_id": "alice" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "self_request");

    let (status, _) = app
        .call("POST", "/friends/requests", Some("alice"), Some(json!({ "to_user_id": "bob" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call("POST", "/friends/requests", Some("bob"), Some(json!({ "to_user_id": "alice" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_relationship");

    let (status, body) = app
        .call(
            "POST",
            "/pings",
            Some("alice"),
            Some(json!({ "receiver_id": "bob", "ping_type": "status", "message": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_friends");

    let (status, body) = app.call("GET", "/pings/missing", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = app
        .call("PATCH", "/friends/requests/whatever", Some("bob"), Some(json!({ "action": "maybe" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_emergency_flow_over_http() {
    let app = test_app().await;
    app.befriend("alice", "bob").await;

    let emergency = json!({ "receiver_id": "bob", "ping_type": "emergency", "message": "Help" });

    let (status, body) = app.call("POST", "/pings", Some("alice"), Some(emergency.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_vip");

    let (status, body) = app
        .call("PATCH", "/friends/alice/vip", Some("bob"), Some(json!({ "is_vip": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counterpart_marks_initiator_vip"], true);

    let mut first_id = String::new();
    for i in 0..3 {
        let (status, body) = app.call("POST", "/pings", Some("alice"), Some(emergency.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "sent");
        if i == 0 {
            first_id = body["id"].as_str().unwrap().to_string();
        }
    }

    let (status, body) = app.call("POST", "/pings", Some("alice"), Some(emergency)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "rate_limited");

    let (status, body) = app.call("GET", "/limits/bob", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining"], 0);

    let (status, body) = app
        .call("POST", &format!("/pings/{first_id}/delivered"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = app
        .call("POST", &format!("/pings/{first_id}/delivered"), Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "delivered");

    let (status, body) = app
        .call(
            "POST",
            &format!("/pings/{first_id}/handshake"),
            Some("bob"),
            Some(json!({ "response_message": "On my way" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response_message"], "On my way");
    assert_eq!(body["status"], "delivered");

    assert_eq!(app.sink.of_kind(PushEventKind::PingCreated).len(), 3);
    assert_eq!(app.sink.of_kind(PushEventKind::HandshakeReceived).len(), 1);

    let (status, body) = app.call("GET", "/pings/history", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_block_and_unblock() {
    let app = test_app().await;
    app.befriend("alice", "bob").await;

    let (status, body) = app.call("POST", "/friends/alice/block", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "blocked");
    assert_eq!(body["blocked_by"], "bob");

    let (status, body) = app.call("GET", "/friends", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = app.call("DELETE", "/friends/bob/block", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("DELETE", "/friends/alice/block", Some("bob"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_checkin_routes() {
    let app = test_app().await;

    let (status, body) = app.call("GET", "/checkin", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = app
        .call(
            "POST",
            "/checkin",
            Some("alice"),
            Some(json!({ "duration_minutes": 45, "message": "running" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "active");
    let session_id = body["id"].clone();

    let (status, body) = app.call("GET", "/checkin", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], session_id);

    let (status, body) = app
        .call("POST", "/checkin", Some("alice"), Some(json!({ "duration_minutes": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (status, body) = app.call("POST", "/checkin/safe", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 1);

    let (status, body) = app.call("POST", "/checkin/safe", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 0);
}

#[tokio::test]
async fn test_missing_username_header_keeps_stored_name() {
    let app = test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header("x-user-id", "u-1")
        .header("x-username", "alice")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = app.call("GET", "/me", Some("u-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (_, found) = app.call("GET", "/users/search?q=ali", Some("bob"), None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["id"], "u-1");
}

#[tokio::test]
async fn test_long_user_id_without_username() {
    let app = test_app().await;
    let long_id = "x".repeat(80);

    let (status, body) = app.call("GET", "/me", Some(&long_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], long_id.as_str());
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let app = test_app().await;

    let (status, body) = app
        .call("POST", "/pings", Some("alice"), Some(json!({ "receiver_id": "bob" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
    assert!(body["error"].as_str().unwrap().contains("ping_type"));

    let request = Request::builder()
        .method("PATCH")
        .uri("/friends/bob/vip")
        .header("x-user-id", "alice")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_pending_requests_list_both_sides() {
    let app = test_app().await;
    app.call("GET", "/me", Some("bob"), None).await;
    app.call("POST", "/friends/requests", Some("alice"), Some(json!({ "to_user_id": "bob" })))
        .await;

    for user in ["alice", "bob"] {
        let (status, body) = app.call("GET", "/friends/requests", Some(user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["initiator_id"], "alice");
    }
}
