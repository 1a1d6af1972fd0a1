//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Authentication Errors**: Missing or invalid credentials
/// - **Authorization Errors**: Valid credentials that don't permit the operation
/// - **Infrastructure Errors**: Key store failures, distinguished from auth
///   failures so integrators can tell outages from bad keys
/// - **Resource Errors**: Requested resources not found
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed outside the authentication path
    /// (e.g., connection error, query error in a route handler).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Client id and/or client secret absent when the gate requires them.
    ///
    /// Returns HTTP 401 Unauthorized. The hint names the missing header(s)
    /// so integrators can fix their connector configuration. It never reveals
    /// whether a given client id exists.
    #[error("API credentials required")]
    MissingCredentials { hint: String },

    /// Unknown client id, secret mismatch, or legacy key mismatch.
    ///
    /// Returns HTTP 401 Unauthorized. Deliberately identical for unknown and
    /// revoked client ids to avoid leaking which ids have ever existed.
    #[error("Invalid API credentials")]
    InvalidCredentials,

    /// Key-management mutation attempted without a valid admin key.
    ///
    /// Returns HTTP 403 Forbidden, independent of client credentials.
    #[error("Admin key required")]
    AdminKeyRequired,

    /// Authenticated, but the key's access tier does not permit writes.
    ///
    /// Returns HTTP 403 Forbidden, distinct from `InvalidCredentials` so
    /// callers can tell "your key works but lacks permission" from
    /// "your key is wrong."
    #[error("API key does not permit write operations")]
    InsufficientPrivileges,

    /// The key store could not be queried while authenticating a request
    /// (query failure or timeout).
    ///
    /// Returns HTTP 503 Service Unavailable. Safe for the caller to retry
    /// with backoff.
    #[error("Key store unavailable")]
    StoreUnavailable,

    /// Requested API key record does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("API key not found")]
    KeyNotFound,

    /// Requested occurrence does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Occurrence not found")]
    OccurrenceNotFound,

    /// Requested risk does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Risk not found")]
    RiskNotFound,

    /// Requested compliance record does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Compliance record not found")]
    ComplianceRecordNotFound,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format (`hint` only where one helps):
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message",
///     "hint": "supply the x-client-id header"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `MissingCredentials`, `InvalidCredentials` → 401 Unauthorized
/// - `AdminKeyRequired`, `InsufficientPrivileges` → 403 Forbidden
/// - `*NotFound` → 404 Not Found
/// - `InvalidRequest` → 400 Bad Request
/// - `StoreUnavailable` → 503 Service Unavailable
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message, hint)
        let (status, code, message, hint) = match self {
            AppError::MissingCredentials { ref hint } => (
                StatusCode::UNAUTHORIZED,
                "missing_credentials",
                self.to_string(),
                Some(hint.clone()),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
                None,
            ),
            AppError::AdminKeyRequired => (
                StatusCode::FORBIDDEN,
                "admin_key_required",
                self.to_string(),
                Some("supply the x-admin-key header".to_string()),
            ),
            AppError::InsufficientPrivileges => (
                StatusCode::FORBIDDEN,
                "insufficient_privileges",
                self.to_string(),
                None,
            ),
            AppError::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                self.to_string(),
                None,
            ),
            AppError::KeyNotFound => {
                (StatusCode::NOT_FOUND, "key_not_found", self.to_string(), None)
            }
            AppError::OccurrenceNotFound => (
                StatusCode::NOT_FOUND,
                "occurrence_not_found",
                self.to_string(),
                None,
            ),
            AppError::RiskNotFound => {
                (StatusCode::NOT_FOUND, "risk_not_found", self.to_string(), None)
            }
            AppError::ComplianceRecordNotFound => (
                StatusCode::NOT_FOUND,
                "compliance_record_not_found",
                self.to_string(),
                None,
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone(), None)
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        // Build JSON response body
        let body = match hint {
            Some(hint) => Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "hint": hint
                }
            })),
            None => Json(json!({
                "error": {
                    "code": code,
                    "message": message
                }
            })),
        };

        // Return the response with status code and JSON body
        (status, body).into_response()
    }
}
