//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Performs business logic (database queries, validation)
//! 3. Returns HTTP response (JSON, status code)

/// API key management endpoints
pub mod api_keys;
/// Compliance record endpoints
pub mod compliance;
/// Dashboard summary endpoint
pub mod dashboard;
/// Health check endpoint
pub mod health;
/// Occurrence (incident report) endpoints
pub mod occurrences;
/// Risk register endpoints
pub mod risks;
