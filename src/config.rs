//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): SQLite connection string, defaults to a local file database
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `LEGACY_API_KEY` (optional): static shared key; when set, the server runs in
///   legacy single-key mode and never consults the key store for authentication
/// - `ADMIN_KEY` (optional): key required for create/revoke operations on API keys
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Static legacy key. Presence of this value selects legacy mode for the
    /// lifetime of the process.
    #[serde(default)]
    pub legacy_api_key: Option<String>,

    /// Key gating key-management mutations. Optional; when absent, those
    /// mutations are gated by client credentials alone.
    #[serde(default)]
    pub admin_key: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

/// Default database location if DATABASE_URL is not set.
///
/// The file is created on first start (see `db::create_pool`).
fn default_database_url() -> String {
    "sqlite:risk_register.db".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into
    /// expected types (e.g., a non-numeric SERVER_PORT).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
