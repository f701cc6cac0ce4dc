//! API integration tests.
//!
//! These tests drive the complete router end-to-end using tower's `oneshot`.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tool_runner::api::{create_router, AppState};
use tower::ServiceExt;

/// Helper to create a JSON request.
fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper to extract JSON from response.
async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

fn app() -> (Router, AppState) {
    let state = AppState::default();
    (create_router(state.clone()), state)
}

// ============================================================================
// Health & Telemetry
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_telemetry_endpoint() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(Method::GET, "/api/telemetry", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["active_processes"], 0);
    assert_eq!(json["cached_results"], 0);
    assert!(json["uptime_seconds"].as_f64().unwrap() >= 0.0);
}

// ============================================================================
// Command Execution
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_execute_command() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/command",
            Some(json!({"command": "echo hello"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["stdout"], "hello\n");
    assert_eq!(json["return_code"], 0);
    assert_eq!(json["timed_out"], false);
    assert!(json["pid"].is_u64());
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_nonzero_exit() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/command",
            Some(json!({"command": "echo oops >&2; exit 3"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["return_code"], 3);
    assert_eq!(json["stderr"], "oops\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_populates_cache() {
    let (app, state) = app();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/command",
            Some(json!({"command": "echo cached", "use_cache": true})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.executor.cache_stats().item_count, 1);

    let response = app
        .oneshot(json_request(Method::GET, "/api/cache/stats", None))
        .await
        .unwrap();
    let json = response_json(response).await;
    assert_eq!(json["items"], 1);
    assert_eq!(json["default_ttl_secs"], 1800);
}

#[tokio::test]
async fn test_execute_empty_command() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/command",
            Some(json!({"command": ""})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_execute_malformed_body() {
    let (app, _) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/command")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

// ============================================================================
// Process Inspection
// ============================================================================

#[tokio::test]
async fn test_list_processes_empty() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(Method::GET, "/api/processes/list", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["count"], 0);
    assert!(json["processes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_process_status_registered() {
    let (app, state) = app();
    state.executor.registry().register(4321, "nmap -p- host");

    let response = app
        .oneshot(json_request(
            Method::GET,
            "/api/processes/status/4321",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["pid"], 4321);
    assert_eq!(json["command"], "nmap -p- host");
    assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn test_process_status_not_found() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::GET,
            "/api/processes/status/999999",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = response_json(response).await;
    assert_eq!(json["code"], "PROCESS_NOT_FOUND");
}

#[tokio::test]
async fn test_terminate_not_found() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/processes/terminate/999999",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_pid_path() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::GET,
            "/api/processes/status/not-a-pid",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard() {
    let (app, state) = app();
    state.executor.registry().register(11, "sleep 60");
    state.executor.registry().register(12, "sleep 61");

    let response = app
        .oneshot(json_request(Method::GET, "/api/processes/dashboard", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["active_processes"], 2);
    assert_eq!(json["processes"].as_array().unwrap().len(), 2);
    assert!(json["timestamp"].as_f64().unwrap() > 0.0);
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_cache_clear() {
    let (app, state) = app();
    state.executor.cache().set(
        "echo hi",
        tool_runner::ExecutionResult::completed(b"hi\n".to_vec(), Vec::new(), 0, 1),
        std::time::Duration::ZERO,
    );
    assert_eq!(state.executor.cache_stats().item_count, 1);

    let response = app
        .oneshot(json_request(Method::POST, "/api/cache/clear", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.executor.cache_stats().item_count, 0);
}

// ============================================================================
// Error Handling
// ============================================================================

#[tokio::test]
async fn test_not_found_route() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(Method::GET, "/nonexistent", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(Method::DELETE, "/api/processes/list", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
