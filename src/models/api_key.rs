//! API key model for the dual-credential authentication scheme.
//!
//! Each integration (e.g., a Power BI connector) holds a public client id and
//! a private client secret. Only the SHA-256 hash of the secret is stored;
//! the plaintext is returned exactly once, at creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Access tier of an API key.
///
/// Limited keys may read application data but not write it. The tier is fixed
/// at creation; there is no upgrade path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Read and write application data
    Full,
    /// Read-only access to application data
    Limited,
}

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table.
///
/// # Lifecycle
///
/// Created active → zero or more authentications update `last_used` →
/// optionally revoked. Revocation is permanent: `revoked_date` is set once,
/// `enabled` drops to false, and no un-revoke operation exists. Revoked
/// records are kept for audit and remain visible in the list endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKey {
    /// Unique identifier for this API key
    pub id: Uuid,

    /// Public identifier presented by the caller, unique across all records
    /// (active or revoked)
    pub client_id: String,

    /// SHA-256 hash of the client secret (64 hex characters).
    /// The plaintext secret is never persisted.
    pub secret_hash: String,

    /// Human-readable label for the integration using this key
    pub name: String,

    /// Whether this key is currently accepted for authentication.
    /// Set to false only by revocation.
    pub enabled: bool,

    /// Access tier, fixed at creation
    pub access_type: AccessType,

    /// Timestamp when this key was created
    pub created_date: DateTime<Utc>,

    /// Who created this key
    pub created_by: String,

    /// Last successful authentication with this key, if any.
    /// Updated best-effort; an update failure never fails the request.
    pub last_used: Option<DateTime<Utc>>,

    /// When this key was revoked, if ever
    pub revoked_date: Option<DateTime<Utc>>,

    /// Who revoked this key, if revoked
    pub revoked_by: Option<String>,
}

/// Request to create a new API key.
///
/// # Example
///
/// ```json
/// {
///   "name": "Power BI reporting",
///   "access_type": "limited"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    pub name: String,
    pub access_type: AccessType,
}

/// Response for a single API key in list operations.
///
/// The secret hash is never serialized, and the plaintext secret is long gone
/// by the time a key can be listed.
#[derive(Debug, Serialize)]
pub struct KeyResponse {
    pub id: Uuid,
    pub client_id: String,
    pub name: String,
    pub enabled: bool,
    pub access_type: AccessType,
    pub created_date: DateTime<Utc>,
    pub created_by: String,
    pub last_used: Option<DateTime<Utc>>,
    pub revoked_date: Option<DateTime<Utc>>,
    pub revoked_by: Option<String>,
}

impl From<ApiKey> for KeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            client_id: key.client_id,
            name: key.name,
            enabled: key.enabled,
            access_type: key.access_type,
            created_date: key.created_date,
            created_by: key.created_by,
            last_used: key.last_used,
            revoked_date: key.revoked_date,
            revoked_by: key.revoked_by,
        }
    }
}

/// Response when creating a new API key.
///
/// # Security Note
///
/// The `client_secret` field is ONLY available here, at creation. It cannot
/// be recovered afterwards; only its hash is stored.
#[derive(Debug, Serialize)]
pub struct CreatedKeyResponse {
    pub id: Uuid,
    pub client_id: String,
    pub client_secret: String,
    pub name: String,
    pub enabled: bool,
    pub access_type: AccessType,
    pub created_date: DateTime<Utc>,
    pub created_by: String,
}

/// Outcome of a revoke operation.
///
/// Revoking an already-revoked key is a reported no-op rather than an error,
/// so integrators can retry revocations safely.
#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub id: Uuid,
    /// `"revoked"` or `"already_revoked"`
    pub status: String,
}
