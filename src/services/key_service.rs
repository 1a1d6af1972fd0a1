//! Key service - lifecycle and store operations for API keys.
//!
//! This service owns everything that touches the `api_keys` table:
//! - Credential generation (client id + secret) and SHA-256 hashing
//! - The lookups the authentication gate runs on every request
//! - Creation, listing, and one-way revocation
//!
//! The plaintext secret exists only in the creation response; the table
//! stores its hash.

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::api_key::{ApiKey, CreateKeyRequest, CreatedKeyResponse, KeyResponse},
};

/// Outcome of a revocation attempt.
///
/// Already-revoked is separated from not-found so that a repeated revoke is a
/// reported no-op rather than a misleading 404.
#[derive(Debug, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,
    AlreadyRevoked,
    NotFound,
}

/// Compute the SHA-256 hex digest of a client secret.
///
/// Deterministic: the same secret always yields the same 64-character hash,
/// which is what makes hash-based lookup and comparison possible.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a cryptographically secure client secret.
///
/// # Output
///
/// 64 hex characters (32 random bytes)
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Generate a public client identifier.
///
/// # Output
///
/// 24 hex characters (12 random bytes). Not a secret, but random enough that
/// collisions are never expected; the unique constraint on the column is the
/// backstop.
pub fn generate_client_id() -> String {
    let bytes: [u8; 12] = rand::random();
    hex::encode(bytes)
}

/// Count keys that are currently accepted for authentication.
///
/// "Active" means enabled and never revoked. A count of zero opens the
/// bootstrap window in the authentication gate.
pub async fn count_active_keys(pool: &DbPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM api_keys WHERE enabled = 1 AND revoked_date IS NULL",
    )
    .fetch_one(pool)
    .await
}

/// Look up an active key by its public client identifier.
///
/// Returns `None` for unknown AND revoked ids alike; callers must not be able
/// to distinguish the two from this function's behavior.
pub async fn find_active_key(pool: &DbPool, client_id: &str) -> Result<Option<ApiKey>, sqlx::Error> {
    sqlx::query_as::<_, ApiKey>(
        r#"
        SELECT id, client_id, secret_hash, name, enabled, access_type,
               created_date, created_by, last_used, revoked_date, revoked_by
        FROM api_keys
        WHERE client_id = $1 AND enabled = 1 AND revoked_date IS NULL
        "#,
    )
    .bind(client_id)
    .fetch_optional(pool)
    .await
}

/// Record a successful authentication on a key.
///
/// Best-effort by contract: the gate spawns this and never awaits it before
/// completing the request, and a failure here is logged and swallowed.
pub async fn touch_last_used(pool: &DbPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE api_keys SET last_used = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create a new API key.
///
/// # Process
///
/// 1. Validate the label
/// 2. Generate client id + secret, hash the secret
/// 3. Insert the record (active, not revoked)
/// 4. Return the record with the plaintext secret (only time it's shown)
pub async fn create_key(
    pool: &DbPool,
    request: CreateKeyRequest,
    created_by: &str,
) -> Result<CreatedKeyResponse, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("Key name must not be empty".to_string()));
    }

    let id = Uuid::new_v4();
    let client_id = generate_client_id();
    let client_secret = generate_secret();
    let secret_hash = hash_secret(&client_secret);
    let created_date = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO api_keys (id, client_id, secret_hash, name, enabled, access_type, created_date, created_by)
        VALUES ($1, $2, $3, $4, 1, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(&client_id)
    .bind(&secret_hash)
    .bind(name)
    .bind(request.access_type)
    .bind(created_date)
    .bind(created_by)
    .execute(pool)
    .await?;

    Ok(CreatedKeyResponse {
        id,
        client_id,
        client_secret,
        name: name.to_string(),
        enabled: true,
        access_type: request.access_type,
        created_date,
        created_by: created_by.to_string(),
    })
}

/// List all keys, including revoked ones.
///
/// Revoked records are kept for audit; secret hashes are never serialized.
pub async fn list_keys(pool: &DbPool) -> Result<Vec<KeyResponse>, AppError> {
    let keys = sqlx::query_as::<_, ApiKey>(
        r#"
        SELECT id, client_id, secret_hash, name, enabled, access_type,
               created_date, created_by, last_used, revoked_date, revoked_by
        FROM api_keys
        ORDER BY created_date DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(keys.into_iter().map(Into::into).collect())
}

/// Revoke a key permanently.
///
/// # Process
///
/// 1. Fetch the record by id (any state)
/// 2. Unknown id → `NotFound`
/// 3. Already revoked → `AlreadyRevoked`, nothing written
/// 4. Otherwise set `enabled = 0`, `revoked_date`, `revoked_by`
///
/// The update re-checks `revoked_date IS NULL`, so a concurrent revoke of the
/// same key resolves to `AlreadyRevoked` rather than overwriting audit fields.
pub async fn revoke_key(
    pool: &DbPool,
    id: Uuid,
    revoked_by: &str,
) -> Result<RevokeOutcome, AppError> {
    let existing = sqlx::query_as::<_, ApiKey>(
        r#"
        SELECT id, client_id, secret_hash, name, enabled, access_type,
               created_date, created_by, last_used, revoked_date, revoked_by
        FROM api_keys
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(existing) = existing else {
        return Ok(RevokeOutcome::NotFound);
    };

    if existing.revoked_date.is_some() {
        return Ok(RevokeOutcome::AlreadyRevoked);
    }

    let updated = sqlx::query(
        r#"
        UPDATE api_keys
        SET enabled = 0, revoked_date = $1, revoked_by = $2
        WHERE id = $3 AND revoked_date IS NULL
        "#,
    )
    .bind(Utc::now())
    .bind(revoked_by)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        // Lost a race with another revoke between the read and the write
        return Ok(RevokeOutcome::AlreadyRevoked);
    }

    Ok(RevokeOutcome::Revoked)
}
