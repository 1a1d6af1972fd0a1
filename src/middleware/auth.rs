//! Credential gate middleware.
//!
//! This middleware intercepts every request under the protected API prefix
//! and decides, before any route handler executes, whether the request is
//! admitted and with what identity. Every request is judged atomically and
//! independently; there are no sessions, tokens, or renewal protocols.
//!
//! # Decision procedure
//!
//! Evaluated in order; the first matching branch determines the outcome:
//!
//! 1. **Legacy mode**: when a static legacy key is configured it supersedes
//!    everything else for the lifetime of the process. Key-management
//!    mutations are gated by the admin key (when one is configured); all
//!    other paths require an exact legacy key match. No identity is attached.
//! 2. **Bootstrap window**: with no legacy key configured and zero active
//!    key records, requests are admitted without credentials so the very
//!    first key can be created: all non-key-management paths, plus create
//!    and list on the key-management paths. The window closes as soon as one
//!    active key exists.
//! 3. **Enforced dual-credential mode**: admin key gate on key-management
//!    mutations, then client id + client secret required, looked up and
//!    verified against the stored SHA-256 hash, then the access tier check
//!    for writes to application data.
//!
//! On success the resolved key record is attached to the request as
//! [`AuthContext`] and the record's `last_used` timestamp is updated
//! fire-and-forget.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    models::api_key::AccessType,
    services::key_service,
};

/// Primary header carrying the public client identifier.
const CLIENT_ID_HEADER: &str = "x-client-id";
/// Fallback header for the client identifier; also the legacy single-key header.
const LEGACY_KEY_HEADER: &str = "x-api-key";
/// Header carrying the client secret.
const CLIENT_SECRET_HEADER: &str = "x-client-secret";
/// Header gating key-management mutations.
const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Route prefix for key-management endpoints (create/list/revoke keys).
const KEY_MANAGEMENT_PREFIX: &str = "/api/v1/keys";

/// Upper bound on any key store query made while authenticating.
/// A slower store surfaces as `StoreUnavailable`, never as a credential error.
const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request. Handlers must
/// treat it as read-only.
///
/// Requests admitted through the bootstrap window or in legacy mode carry no
/// context at all, so handlers that record authorship extract it as
/// `Option<Extension<AuthContext>>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated API key record
    pub api_key_id: Uuid,

    /// Public client identifier the caller presented
    pub client_id: String,

    /// Label of the integration using this key
    pub name: String,

    /// Access tier; `Limited` keys are rejected for application-data writes
    /// before the handler runs
    pub access_type: AccessType,

    /// Always true at admission; revoked or disabled records never get here
    pub enabled: bool,
}

/// Credential gate middleware function.
///
/// # Arguments
///
/// * `State(state)` - Shared pool and resolved key configuration
/// * `request` - Incoming HTTP request (mutable to add extensions)
/// * `next` - Next middleware/handler in the chain
///
/// # Returns
///
/// - `Ok(Response)` if admitted (calls next handler)
/// - `Err(AppError)` with one of the gate's rejection kinds otherwise
///
/// Every branch terminates in an explicit admit-or-reject decision; store
/// failures are mapped to `StoreUnavailable` rather than escaping as 500s.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Credentials may also arrive as query parameters (some reporting tools
    // cannot set arbitrary headers)
    let query: HashMap<String, String> = request
        .uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    // Branch 1: legacy single-key mode supersedes everything else
    if let Some(legacy_key) = &state.auth.legacy_api_key {
        return legacy_gate(legacy_key, &state, &method, &path, &query, request, next).await;
    }

    // Branch 2: bootstrap window, open only while zero active keys exist
    let active_keys = store_query(key_service::count_active_keys(&state.pool)).await?;
    if active_keys == 0 && bootstrap_admits(&method, &path) {
        tracing::debug!(%path, "no active keys; bootstrap window admits request");
        return Ok(next.run(request).await);
    }

    // Branch 3: enforced dual-credential checks.
    // (a) admin key gate on key-management mutations, when one is configured
    if is_key_management(&path) && is_mutating(&method) {
        if let Some(admin_key) = &state.auth.admin_key {
            let supplied = header_str(request.headers(), ADMIN_KEY_HEADER);
            if !supplied.is_some_and(|value| secure_eq(value, admin_key)) {
                tracing::warn!(%path, "key-management mutation without valid admin key");
                return Err(AppError::AdminKeyRequired);
            }
        }
    }

    // (b) both client id and secret must be present
    let (client_id, client_secret) = match extract_credentials(request.headers(), &query) {
        (Some(id), Some(secret)) => (id, secret),
        (client_id, client_secret) => {
            let mut missing = Vec::new();
            if client_id.is_none() {
                missing.push(CLIENT_ID_HEADER);
            }
            if client_secret.is_none() {
                missing.push(CLIENT_SECRET_HEADER);
            }
            return Err(AppError::MissingCredentials {
                hint: format!("supply the {} header(s)", missing.join(" and ")),
            });
        }
    };

    // (c) look up the active record. Unknown and revoked ids are
    // indistinguishable from here on.
    let record = store_query(key_service::find_active_key(&state.pool, &client_id))
        .await?
        .ok_or_else(|| {
            tracing::debug!("authentication failed: no active key for presented client id");
            AppError::InvalidCredentials
        })?;

    // (d) hash the supplied secret and compare against the stored hash in
    // constant time. Hashes are compared, never plaintext.
    let supplied_hash = key_service::hash_secret(&client_secret);
    if !secure_eq(&supplied_hash, &record.secret_hash) {
        tracing::debug!(client_id = %record.client_id, "authentication failed: secret mismatch");
        return Err(AppError::InvalidCredentials);
    }

    // (e) limited keys may not write application data. Reads are open to both
    // tiers, and key-management mutations were already gated in (a).
    if is_mutating(&method) && !is_key_management(&path) && record.access_type != AccessType::Full {
        return Err(AppError::InsufficientPrivileges);
    }

    // (f) admitted. Record last use without blocking or failing the request.
    let pool = state.pool.clone();
    let key_id = record.id;
    tokio::spawn(async move {
        if let Err(e) = key_service::touch_last_used(&pool, key_id).await {
            tracing::warn!(%key_id, "failed to update last_used: {e}");
        }
    });

    let auth_context = AuthContext {
        api_key_id: record.id,
        client_id: record.client_id,
        name: record.name,
        access_type: record.access_type,
        enabled: record.enabled,
    };

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

/// Legacy single-key mode.
///
/// Key-management mutations require the admin key when one is configured;
/// every other request requires an exact match on the static legacy key,
/// from the `x-api-key` header or the `api_key` query parameter. No key
/// record is resolved, so no identity is attached.
async fn legacy_gate(
    legacy_key: &str,
    state: &AppState,
    method: &Method,
    path: &str,
    query: &HashMap<String, String>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_key_management(path) && is_mutating(method) {
        if let Some(admin_key) = &state.auth.admin_key {
            let supplied = header_str(request.headers(), ADMIN_KEY_HEADER);
            if !supplied.is_some_and(|value| secure_eq(value, admin_key)) {
                return Err(AppError::AdminKeyRequired);
            }
            return Ok(next.run(request).await);
        }
        // No admin key configured: the legacy key check below applies instead
    }

    let supplied = header_str(request.headers(), LEGACY_KEY_HEADER)
        .map(str::to_owned)
        .or_else(|| query.get("api_key").cloned());

    match supplied {
        Some(value) if secure_eq(&value, legacy_key) => Ok(next.run(request).await),
        _ => Err(AppError::InvalidCredentials),
    }
}

/// Run a key store query with the gate's timeout.
///
/// Both query errors and timeouts surface as `StoreUnavailable`, so operators
/// can tell infrastructure failures apart from credential rejections.
async fn store_query<T>(
    query: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, AppError> {
    match tokio::time::timeout(STORE_TIMEOUT, query).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!("key store query failed: {e}");
            Err(AppError::StoreUnavailable)
        }
        Err(_) => {
            tracing::error!("key store query timed out after {STORE_TIMEOUT:?}");
            Err(AppError::StoreUnavailable)
        }
    }
}

/// Pull the client id and secret out of headers, falling back to query
/// parameters. The id additionally falls back to the legacy key header so
/// older integrations keep working unchanged.
fn extract_credentials(
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> (Option<String>, Option<String>) {
    let client_id = header_str(headers, CLIENT_ID_HEADER)
        .or_else(|| header_str(headers, LEGACY_KEY_HEADER))
        .map(str::to_owned)
        .or_else(|| query.get("client_id").cloned())
        .or_else(|| query.get("api_key").cloned());

    let client_secret = header_str(headers, CLIENT_SECRET_HEADER)
        .map(str::to_owned)
        .or_else(|| query.get("client_secret").cloned());

    (client_id, client_secret)
}

/// Extract a header value as a string, if present and valid UTF-8.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Whether the path belongs to the key-management endpoints.
fn is_key_management(path: &str) -> bool {
    path == KEY_MANAGEMENT_PREFIX
        || path
            .strip_prefix(KEY_MANAGEMENT_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Whether the method mutates state.
fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// What the bootstrap window admits: create and list on key-management paths
/// (so the very first key can be made), everything elsewhere. Revocation is
/// not a bootstrap operation and falls through to the enforced checks.
fn bootstrap_admits(method: &Method, path: &str) -> bool {
    if is_key_management(path) {
        matches!(*method, Method::GET | Method::POST)
    } else {
        true
    }
}

/// Constant-time string comparison.
///
/// `==` on strings short-circuits on the first differing byte. The gate
/// compares secret hashes and configured keys, and neither comparison may
/// leak how much of a guess was correct through timing.
fn secure_eq(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
