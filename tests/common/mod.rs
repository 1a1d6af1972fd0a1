//! Shared helpers for integration tests.
//!
//! Each test builds the production router against its own in-memory SQLite
//! database with the real migrations applied, then drives it with
//! `tower::ServiceExt::oneshot`.

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use risk_register_server::{
    app::{AppState, AuthSettings, router},
    db::{self, DbPool},
};

/// Fresh in-memory database with migrations applied.
///
/// A single connection that never expires, so the in-memory database lives as
/// long as the pool.
pub async fn test_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    db::run_migrations(&pool).await.expect("migrations failed");

    pool
}

/// Build the production router over the given pool and key configuration.
pub fn test_app(pool: DbPool, legacy_api_key: Option<&str>, admin_key: Option<&str>) -> Router {
    router(AppState {
        pool,
        auth: AuthSettings {
            legacy_api_key: legacy_api_key.map(String::from),
            admin_key: admin_key.map(String::from),
        },
    })
}

/// GET request with optional headers.
pub fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

/// DELETE request with optional headers.
pub fn delete(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

/// JSON request with a body (POST/PUT) and optional headers.
pub fn json_request(
    method: &str,
    uri: &str,
    body: &Value,
    headers: &[(&str, &str)],
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Drive one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Drive one request and decode the JSON response body.
pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(app, request).await;
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

/// Error code out of the standard error envelope.
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

/// Create a key through the bootstrap window (the app must have zero active
/// keys). Returns `(id, client_id, client_secret)`.
pub async fn bootstrap_key(app: &Router, name: &str, access_type: &str) -> (String, String, String) {
    let (status, body) = send_json(
        app,
        json_request(
            "POST",
            "/api/v1/keys",
            &serde_json::json!({ "name": name, "access_type": access_type }),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "bootstrap key creation failed: {body}");

    (
        body["id"].as_str().unwrap().to_string(),
        body["client_id"].as_str().unwrap().to_string(),
        body["client_secret"].as_str().unwrap().to_string(),
    )
}
