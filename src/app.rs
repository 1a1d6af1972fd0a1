//! Shared application state and router assembly.
//!
//! The router is built here (rather than in `main`) so integration tests can
//! drive the exact production routing and middleware stack against their own
//! pool and key configuration.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::{config::Config, db::DbPool, handlers, middleware};

/// Key configuration the credential gate reads on every request.
///
/// Resolved once at process start from the environment; immutable afterwards.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Static legacy key; presence selects legacy single-key mode
    pub legacy_api_key: Option<String>,

    /// Key required for key-management mutations, when configured
    pub admin_key: Option<String>,
}

/// State shared with all handlers and the credential gate.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(pool: DbPool, config: &Config) -> Self {
        Self {
            pool,
            auth: AuthSettings {
                legacy_api_key: config.legacy_api_key.clone(),
                admin_key: config.admin_key.clone(),
            },
        }
    }
}

/// Build the application router.
///
/// Everything under `/api/v1` passes through the credential gate; `/health`
/// deliberately does not, so monitors need no credentials in any mode.
pub fn router(state: AppState) -> Router {
    // Create authenticated routes (API endpoints)
    let protected_routes = Router::new()
        // Key management routes; the gate applies its admin-key and
        // bootstrap rules to this prefix
        .route("/api/v1/keys", post(handlers::api_keys::create_key))
        .route("/api/v1/keys", get(handlers::api_keys::list_keys))
        .route("/api/v1/keys/{id}", delete(handlers::api_keys::revoke_key))
        // Occurrence routes
        .route(
            "/api/v1/occurrences",
            post(handlers::occurrences::create_occurrence),
        )
        .route(
            "/api/v1/occurrences",
            get(handlers::occurrences::list_occurrences),
        )
        .route(
            "/api/v1/occurrences/{id}",
            get(handlers::occurrences::get_occurrence),
        )
        .route(
            "/api/v1/occurrences/{id}",
            put(handlers::occurrences::update_occurrence),
        )
        // Risk register routes
        .route("/api/v1/risks", post(handlers::risks::create_risk))
        .route("/api/v1/risks", get(handlers::risks::list_risks))
        .route("/api/v1/risks/{id}", get(handlers::risks::get_risk))
        .route("/api/v1/risks/{id}", put(handlers::risks::update_risk))
        // Compliance routes
        .route(
            "/api/v1/compliance",
            post(handlers::compliance::create_record),
        )
        .route("/api/v1/compliance", get(handlers::compliance::list_records))
        .route(
            "/api/v1/compliance/{id}",
            get(handlers::compliance::get_record),
        )
        .route(
            "/api/v1/compliance/{id}",
            put(handlers::compliance::update_record),
        )
        // Dashboard
        .route("/api/v1/dashboard", get(handlers::dashboard::summary))
        // Apply the credential gate to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine authenticated routes with public routes
    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        // Merge authenticated routes
        .merge(protected_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share state with all handlers via State extraction
        .with_state(state)
}
