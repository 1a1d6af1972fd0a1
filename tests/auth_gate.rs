//! End-to-end tests for the credential gate.
//!
//! Each test drives the real router (routes + middleware + store) against an
//! in-memory database, covering the three gate modes: bootstrap window,
//! enforced dual-credential, and legacy single-key.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::json;

use common::{
    bootstrap_key, delete, error_code, get, json_request, send_json, test_app, test_pool,
};
use risk_register_server::{
    models::api_key::{AccessType, CreateKeyRequest},
    services::key_service,
};

/// Read a key's last_used straight from the store.
async fn last_used(pool: &risk_register_server::db::DbPool, client_id: &str) -> Option<DateTime<Utc>> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT last_used FROM api_keys WHERE client_id = $1",
    )
    .bind(client_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Bootstrap window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bootstrap_admits_requests_without_credentials_until_first_key() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);

    // Zero active keys: application data is open, reads and writes alike
    let (status, _) = send_json(&app, get("/api/v1/occurrences", &[])).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/occurrences",
            &json!({ "title": "Spill in corridor B", "severity": "low" }),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The first key can be created with no credentials at all
    let _ = bootstrap_key(&app, "first key", "full").await;

    // One active key now exists: the window is closed
    let (status, body) = send_json(&app, get("/api/v1/occurrences", &[])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "missing_credentials");
}

#[tokio::test]
async fn bootstrap_stays_open_when_admin_key_is_configured() {
    let pool = test_pool().await;
    // The window is driven by the active-key count, not by admin-key presence
    let app = test_app(pool, None, Some("admin-secret"));

    let (status, body) = send_json(&app, get("/api/v1/keys", &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn revocation_is_not_a_bootstrap_operation() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);

    // Zero keys, but DELETE on a key-management path is not admitted openly
    let (status, body) = send_json(
        &app,
        delete(
            "/api/v1/keys/00000000-0000-0000-0000-000000000000",
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "missing_credentials");
}

// ---------------------------------------------------------------------------
// Enforced dual-credential mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_credentials_are_admitted_and_last_used_is_recorded() {
    let pool = test_pool().await;
    let app = test_app(pool.clone(), None, None);
    let (_, client_id, secret) = bootstrap_key(&app, "reporting", "full").await;

    assert_eq!(last_used(&pool, &client_id).await, None);

    let (status, _) = send_json(
        &app,
        get(
            "/api/v1/occurrences",
            &[("x-client-id", &client_id), ("x-client-secret", &secret)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The timestamp write is fire-and-forget; give it a moment to land
    let mut recorded = None;
    for _ in 0..100 {
        recorded = last_used(&pool, &client_id).await;
        if recorded.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(recorded.is_some(), "last_used was never recorded");
}

#[tokio::test]
async fn wrong_secret_is_rejected_without_touching_last_used() {
    let pool = test_pool().await;
    let app = test_app(pool.clone(), None, None);
    let (_, client_id, _secret) = bootstrap_key(&app, "reporting", "full").await;

    let (status, body) = send_json(
        &app,
        get(
            "/api/v1/occurrences",
            &[
                ("x-client-id", &client_id),
                ("x-client-secret", "not-the-secret"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "invalid_credentials");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(last_used(&pool, &client_id).await, None);
}

#[tokio::test]
async fn unknown_client_id_is_rejected_with_the_same_code_as_a_bad_secret() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);
    let _ = bootstrap_key(&app, "reporting", "full").await;

    let (status, body) = send_json(
        &app,
        get(
            "/api/v1/occurrences",
            &[
                ("x-client-id", "never-issued"),
                ("x-client-secret", "whatever"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "invalid_credentials");
}

#[tokio::test]
async fn credentials_are_accepted_as_query_parameters() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);
    let (_, client_id, secret) = bootstrap_key(&app, "reporting", "full").await;

    let uri = format!(
        "/api/v1/occurrences?client_id={client_id}&client_secret={secret}"
    );
    let (status, _) = send_json(&app, get(&uri, &[])).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_credentials_rejection_names_the_absent_headers() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);
    let (_, client_id, _) = bootstrap_key(&app, "reporting", "full").await;

    // Nothing supplied: both headers named
    let (status, body) = send_json(&app, get("/api/v1/occurrences", &[])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "missing_credentials");
    let hint = body["error"]["hint"].as_str().unwrap();
    assert!(hint.contains("x-client-id"));
    assert!(hint.contains("x-client-secret"));

    // Only the id supplied: only the secret named
    let (_, body) = send_json(
        &app,
        get("/api/v1/occurrences", &[("x-client-id", &client_id)]),
    )
    .await;
    let hint = body["error"]["hint"].as_str().unwrap();
    assert!(hint.contains("x-client-secret"));
    assert!(!hint.contains("x-client-id"));
}

#[tokio::test]
async fn limited_keys_can_read_but_not_write_application_data() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);
    let (_, full_id, full_secret) = bootstrap_key(&app, "writer", "full").await;

    // A second, limited key is created with the first key's credentials
    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/keys",
            &json!({ "name": "read-only reporting", "access_type": "limited" }),
            &[("x-client-id", &full_id), ("x-client-secret", &full_secret)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let limited_id = body["client_id"].as_str().unwrap().to_string();
    let limited_secret = body["client_secret"].as_str().unwrap().to_string();
    let limited_creds: [(&str, &str); 2] = [
        ("x-client-id", &limited_id),
        ("x-client-secret", &limited_secret),
    ];

    // Writes are refused with a code distinct from invalid credentials
    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/occurrences",
            &json!({ "title": "Unauthorized write", "severity": "low" }),
            &limited_creds,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "insufficient_privileges");

    // The same key reads the same path fine
    let (status, _) = send_json(&app, get("/api/v1/occurrences", &limited_creds)).await;
    assert_eq!(status, StatusCode::OK);

    // And the full key writes fine
    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/occurrences",
            &json!({ "title": "Authorized write", "severity": "low" }),
            &[("x-client-id", &full_id), ("x-client-secret", &full_secret)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn revoked_keys_are_rejected_like_unknown_ones() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);
    let (_, full_id, full_secret) = bootstrap_key(&app, "admin", "full").await;
    let full_creds: [(&str, &str); 2] = [
        ("x-client-id", &full_id),
        ("x-client-secret", &full_secret),
    ];

    // Create and then revoke a second key
    let (_, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/keys",
            &json!({ "name": "short-lived", "access_type": "full" }),
            &full_creds,
        ),
    )
    .await;
    let doomed_id = body["id"].as_str().unwrap().to_string();
    let doomed_client_id = body["client_id"].as_str().unwrap().to_string();
    let doomed_secret = body["client_secret"].as_str().unwrap().to_string();

    // The new key works before revocation
    let (status, _) = send_json(
        &app,
        get(
            "/api/v1/occurrences",
            &[
                ("x-client-id", &doomed_client_id),
                ("x-client-secret", &doomed_secret),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        &app,
        delete(&format!("/api/v1/keys/{doomed_id}"), &full_creds),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "revoked");

    // Previously-valid credentials now fail with the generic credential error
    let (status, body) = send_json(
        &app,
        get(
            "/api/v1/occurrences",
            &[
                ("x-client-id", &doomed_client_id),
                ("x-client-secret", &doomed_secret),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "invalid_credentials");

    // The record is still listed, marked revoked, for audit
    let (_, body) = send_json(&app, get("/api/v1/keys", &full_creds)).await;
    let listed = body
        .as_array()
        .unwrap()
        .iter()
        .find(|k| k["id"] == doomed_id.as_str())
        .expect("revoked key missing from list");
    assert_eq!(listed["enabled"], false);
    assert!(listed["revoked_date"].is_string());
}

#[tokio::test]
async fn revoking_twice_reports_a_no_op_and_unknown_ids_are_404() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);
    let (_, full_id, full_secret) = bootstrap_key(&app, "admin", "full").await;
    let full_creds: [(&str, &str); 2] = [
        ("x-client-id", &full_id),
        ("x-client-secret", &full_secret),
    ];

    let (_, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/keys",
            &json!({ "name": "short-lived", "access_type": "limited" }),
            &full_creds,
        ),
    )
    .await;
    let doomed_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &app,
        delete(&format!("/api/v1/keys/{doomed_id}"), &full_creds),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "revoked");

    // Second revoke: reported no-op, not an error, not a 404
    let (status, body) = send_json(
        &app,
        delete(&format!("/api/v1/keys/{doomed_id}"), &full_creds),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already_revoked");

    // A key that never existed is a 404
    let (status, body) = send_json(
        &app,
        delete(
            &format!("/api/v1/keys/{}", uuid::Uuid::new_v4()),
            &full_creds,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "key_not_found");
}

#[tokio::test]
async fn admin_key_gates_key_management_mutations_once_enforced() {
    let pool = test_pool().await;
    let app = test_app(pool.clone(), None, Some("admin-secret"));

    // Seed an active key directly so the bootstrap window is closed
    let seeded = key_service::create_key(
        &pool,
        CreateKeyRequest {
            name: "seeded".to_string(),
            access_type: AccessType::Full,
        },
        "setup",
    )
    .await
    .unwrap();
    let creds: [(&str, &str); 2] = [
        ("x-client-id", &seeded.client_id),
        ("x-client-secret", &seeded.client_secret),
    ];

    // Valid client credentials alone are not enough for a key mutation
    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/keys",
            &json!({ "name": "second", "access_type": "full" }),
            &creds,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "admin_key_required");
    assert!(body["error"]["hint"].as_str().unwrap().contains("x-admin-key"));

    // A wrong admin key is rejected the same way
    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/keys",
            &json!({ "name": "second", "access_type": "full" }),
            &[
                ("x-client-id", &seeded.client_id),
                ("x-client-secret", &seeded.client_secret),
                ("x-admin-key", "wrong"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin key + client credentials succeed
    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/keys",
            &json!({ "name": "second", "access_type": "full" }),
            &[
                ("x-client-id", &seeded.client_id),
                ("x-client-secret", &seeded.client_secret),
                ("x-admin-key", "admin-secret"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Listing keys is not a mutation and needs no admin key
    let (status, _) = send_json(&app, get("/api/v1/keys", &creds)).await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Legacy single-key mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn legacy_mode_matches_the_static_key_exactly() {
    let pool = test_pool().await;
    let app = test_app(pool, Some("legacy-key-value"), None);

    // Correct key in the header
    let (status, _) = send_json(
        &app,
        get("/api/v1/occurrences", &[("x-api-key", "legacy-key-value")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Correct key as a query parameter
    let (status, _) = send_json(
        &app,
        get("/api/v1/occurrences?api_key=legacy-key-value", &[]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Wrong key
    let (status, body) = send_json(
        &app,
        get("/api/v1/occurrences", &[("x-api-key", "nope")]),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "invalid_credentials");

    // No bootstrap window in legacy mode, even with zero key records
    let (status, _) = send_json(&app, get("/api/v1/occurrences", &[])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn legacy_mode_gates_key_mutations_with_the_admin_key() {
    let pool = test_pool().await;
    let app = test_app(pool, Some("legacy-key-value"), Some("admin-secret"));

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/keys",
            &json!({ "name": "new", "access_type": "full" }),
            &[("x-api-key", "legacy-key-value")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "admin_key_required");

    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/keys",
            &json!({ "name": "new", "access_type": "full" }),
            &[("x-admin-key", "admin-secret")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Cross-mode invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_needs_no_credentials_in_any_mode() {
    let pool = test_pool().await;
    let app = test_app(pool.clone(), None, None);
    let _ = bootstrap_key(&app, "key", "full").await;

    let (status, _) = send_json(&app, get("/health", &[])).await;
    assert_eq!(status, StatusCode::OK);

    let legacy_app = test_app(pool, Some("legacy-key-value"), None);
    let (status, _) = send_json(&legacy_app, get("/health", &[])).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn resolved_identity_is_attached_to_admitted_requests() {
    let pool = test_pool().await;
    let app = test_app(pool, None, None);
    let (_, client_id, secret) = bootstrap_key(&app, "night shift terminal", "full").await;

    // A write that names no reporter falls back to the key's label, which
    // only works if the gate attached the resolved record
    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/v1/occurrences",
            &json!({ "title": "Guard rail bent", "severity": "medium" }),
            &[("x-client-id", &client_id), ("x-client-secret", &secret)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["reported_by"], "night shift terminal");
}
