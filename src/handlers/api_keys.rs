//! HTTP handlers for API key management.
//!
//! These are the key-management endpoints the credential gate treats
//! specially: open for create/list during the bootstrap window, gated by the
//! admin key for mutations once it closes.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::api_key::{CreateKeyRequest, KeyResponse, RevokeResponse};
use crate::services::key_service::{self, RevokeOutcome};

/// Name recorded as the actor when a request was admitted without identity
/// (bootstrap window or legacy mode).
const ANONYMOUS_ACTOR: &str = "bootstrap";

/// Create a new API key.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Power BI reporting",
///   "access_type": "limited"
/// }
/// ```
///
/// # Response
///
/// Returns 201 Created. The `client_secret` is only returned here, once;
/// after this response only its hash exists.
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "client_id": "4f2a9c1d8e3b7a6f5c4d2e1b",
///   "client_secret": "a1b2c3d4e5f6...",
///   "name": "Power BI reporting",
///   "enabled": true,
///   "access_type": "limited",
///   "created_date": "2026-08-07T10:30:00Z",
///   "created_by": "bootstrap"
/// }
/// ```
pub async fn create_key(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Json(request): Json<CreateKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created_by = actor_name(&auth);
    let key = key_service::create_key(&state.pool, request, &created_by).await?;

    Ok((StatusCode::CREATED, Json(key)))
}

/// List all API keys, including revoked ones.
///
/// Revoked records stay listable for audit. Secrets and secret hashes are
/// never included.
pub async fn list_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<KeyResponse>>, AppError> {
    let keys = key_service::list_keys(&state.pool).await?;

    Ok(Json(keys))
}

/// Revoke an API key permanently.
///
/// # Response
///
/// Returns 200 OK with the outcome. Revoking an already-revoked key reports
/// `"already_revoked"` instead of erroring, so retries are safe. Unknown ids
/// return 404.
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "status": "revoked"
/// }
/// ```
pub async fn revoke_key(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Path(key_id): Path<Uuid>,
) -> Result<Json<RevokeResponse>, AppError> {
    let revoked_by = actor_name(&auth);

    match key_service::revoke_key(&state.pool, key_id, &revoked_by).await? {
        RevokeOutcome::Revoked => Ok(Json(RevokeResponse {
            id: key_id,
            status: "revoked".to_string(),
        })),
        RevokeOutcome::AlreadyRevoked => Ok(Json(RevokeResponse {
            id: key_id,
            status: "already_revoked".to_string(),
        })),
        RevokeOutcome::NotFound => Err(AppError::KeyNotFound),
    }
}

/// The name to record as the acting party for audit fields.
fn actor_name(auth: &Option<Extension<AuthContext>>) -> String {
    auth.as_ref()
        .map(|Extension(context)| context.name.clone())
        .unwrap_or_else(|| ANONYMOUS_ACTOR.to_string())
}
