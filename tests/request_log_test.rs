//! Request logging through the full middleware stack.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use snippit::request_log::QueryValue;
use snippit::{AppConfig, HttpServer, Shutdown};

mod common;
use common::{get, json, start_mock_backend, TestApp};

#[tokio::test]
async fn test_every_api_request_is_logged() {
    let mut app = TestApp::new();
    let (_, token) = app.identity.login_as("dev@example.com");

    let request = axum::http::Request::builder()
        .uri("/api/snippets?tag=a&tag=b&page=1")
        .header("authorization", format!("Bearer {token}"))
        .header("cookie", "sb=1")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .header("user-agent", "integration-test")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, headers, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let record = app.next_log().await;
    assert_eq!(record.method, "GET");
    assert_eq!(record.url, "/api/snippets");
    assert_eq!(record.ip_address, "203.0.113.7");
    assert_eq!(record.user_agent, "integration-test");
    assert_eq!(record.response_status, 200);
    assert_eq!(record.body, None);
    assert_eq!(
        record.query_params["tag"],
        QueryValue::Multi(vec!["a".into(), "b".into()])
    );
    assert_eq!(record.query_params["page"], QueryValue::Single("1".into()));
    assert!(!record.headers.contains_key("authorization"));
    assert!(!record.headers.contains_key("cookie"));
    assert_eq!(
        record.headers.get("x-request-id").map(String::as_str),
        headers.get("x-request-id").and_then(|v| v.to_str().ok())
    );
    assert_eq!(record.response_body.unwrap()["total"], 0);
}

#[tokio::test]
async fn test_error_responses_are_logged() {
    let mut app = TestApp::new();

    let (status, _, _) = app.send(get("/api/snippets", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let record = app.next_log().await;
    assert_eq!(record.response_status, 401);
    assert_eq!(record.response_body, Some(json!({ "error": "Unauthorized" })));
    assert_eq!(record.ip_address, "unknown");
    assert_eq!(record.user_agent, "unknown");
}

#[tokio::test]
async fn test_request_body_captured_and_forwarded() {
    let mut app = TestApp::new();
    let payload = r#"{"email":"new@example.com","password":"hunter22"}"#;

    let (status, _, body) = app.send(json("POST", "/api/auth/register", None, payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "new@example.com");

    let record = app.next_log().await;
    assert_eq!(
        record.body,
        Some(json!({ "email": "new@example.com", "password": "hunter22" }))
    );
    assert_eq!(record.response_body.unwrap()["success"], true);
}

#[tokio::test]
async fn test_unparsable_body_logged_as_null() {
    let mut app = TestApp::new();

    let (status, _, _) = app.send(json("POST", "/api/auth/login", None, "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let record = app.next_log().await;
    assert_eq!(record.body, Some(Value::Null));
    assert_eq!(record.response_status, 400);

    app.send(json("POST", "/api/auth/logout", None, "")).await;
    assert_eq!(app.next_log().await.body, Some(Value::Null));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = AppConfig::default();
    config.limits.max_body_size = 16;
    let mut app = TestApp::with_config(config);

    let payload = r#"{"email":"someone@example.com","password":"long enough"}"#;
    let (status, _, body) = app.send(json("POST", "/api/auth/register", None, payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({ "error": "Payload too large" }));

    let record = app.next_log().await;
    assert_eq!(record.response_status, 413);
    assert_eq!(record.body, Some(Value::Null));
}

#[tokio::test]
async fn test_debug_routes_are_not_logged() {
    let mut config = AppConfig::default();
    config.debug.endpoints_enabled = true;
    let mut app = TestApp::with_config(config);

    let (status, _, _) = app.send(get("/api/debug", None)).await;
    assert_eq!(status, StatusCode::OK);
    app.send(get("/api/health", None)).await;

    assert_eq!(app.next_log().await.url, "/api/health");
    assert!(app.logs.try_recv().is_err());
}

#[tokio::test]
async fn test_records_reach_the_store_over_http() {
    let (backend, mut captured) = start_mock_backend().await;

    let mut config = AppConfig::default();
    config.store.url = Some(format!("http://{backend}"));
    config.store.service_role_key = Some("service-key".to_string());
    config.store.anon_key = Some("anon-key".to_string());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = tokio::spawn(HttpServer::new(config).run(listener, shutdown.subscribe()));

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/api/cron/health-check?run=now"))
        .header("x-forwarded-for", "198.51.100.4")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "scheduled_health_check");

    let ping = tokio::time::timeout(Duration::from_secs(2), captured.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ping.path, "/auth/v1/health");
    assert_eq!(ping.headers["apikey"], "anon-key");

    let insert = tokio::time::timeout(Duration::from_secs(2), captured.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(insert.method, "POST");
    assert_eq!(insert.path, "/rest/v1/request_logs");
    assert_eq!(insert.headers["apikey"], "service-key");
    assert_eq!(insert.headers["authorization"], "Bearer service-key");
    assert_eq!(insert.headers["prefer"], "return=minimal");

    let row = insert.body;
    assert_eq!(row["method"], "GET");
    assert_eq!(row["url"], "/api/cron/health-check");
    assert_eq!(row["ip_address"], "198.51.100.4");
    assert_eq!(row["query_params"], json!({ "run": "now" }));
    assert_eq!(row["response_status"], 200);
    assert_eq!(row["response_body"]["success"], true);
    assert!(row.get("body").is_none());
    assert!(row["response_time"].is_u64());

    shutdown.trigger();
    server.await.unwrap().unwrap();
}
