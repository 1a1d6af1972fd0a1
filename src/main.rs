//! Risk Register Server - Main Application Entry Point
//!
//! This is a REST API server for a risk/incident/compliance register. It provides authenticated endpoints for reporting occurrences, maintaining the risk register and compliance records, and managing the API keys external reporting tools authenticate with.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: SQLite with sqlx (async queries)
//! - **Authentication**: dual-credential API keys (client id + SHA-256 hashed secret),
//!   with a legacy single-key mode and an open bootstrap window before the first key exists
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use tracing_subscriber::EnvFilter;

use risk_register_server::{
    app::{AppState, router},
    config::Config,
    db,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");
    if config.legacy_api_key.is_some() {
        tracing::warn!("LEGACY_API_KEY set; running in legacy single-key mode");
    }

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let state = AppState::new(pool, &config);
    let app = router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
