//! Configuration loader for the fall detection dashboard backend.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). By consolidating configuration logic
//! here, we avoid scattering `env::var` calls throughout the codebase.
//!
//! The database credentials are deliberately optional: a missing
//! `FIREBASE_DATABASE_URL` switches the service into mock mode rather than
//! failing startup, so the dashboard stays demoable without credentials.

use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional port number environment variable with a default value.
macro_rules! parse_env_u16 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u16>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable, treating empty as unset.
macro_rules! optional_env {
    ($var_name:expr) => {
        env::var($var_name).ok().filter(|v| !v.is_empty())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Realtime database base URL; `None` puts the service in mock mode.
    pub database_url: Option<String>,

    /// Legacy database auth token appended to REST reads.
    pub database_secret: Option<String>,

    /// Storage bucket name used to resolve relative video paths.
    pub storage_bucket: Option<String>,

    /// Database path holding the fall detection records.
    pub falls_path: String,

    /// HTTP listen port.
    pub port: u16,

    /// Default page size for the falls listing API.
    pub default_per_page: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `FIREBASE_DATABASE_URL` – realtime database base URL (absent: mock mode)
/// - `FIREBASE_DATABASE_SECRET` – auth token for REST reads
/// - `FIREBASE_STORAGE_BUCKET` – storage bucket for video URLs
/// - `FALLS_PATH` – database path for records (default: `fall_detections`)
/// - `DASHBOARD_PORT` – HTTP listen port (default: 5000)
/// - `DEFAULT_PER_PAGE` – default API page size (default: 10)
///
/// Returns an error only if a numeric variable is present but malformed.
pub fn load_from_env() -> Result<Config> {
    // ---
    let database_url = optional_env!("FIREBASE_DATABASE_URL");
    let database_secret = optional_env!("FIREBASE_DATABASE_SECRET");
    let storage_bucket = optional_env!("FIREBASE_STORAGE_BUCKET");
    let falls_path =
        optional_env!("FALLS_PATH").unwrap_or_else(|| "fall_detections".to_string());
    let port = parse_env_u16!("DASHBOARD_PORT", 5000);
    let default_per_page = parse_env_u32!("DEFAULT_PER_PAGE", 10);

    Ok(Config {
        database_url,
        database_secret,
        storage_bucket,
        falls_path,
        port,
        default_per_page,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database secret while showing all configuration values
    /// that were loaded.
    pub fn log_config(&self) {
        // ---
        let database_url = self.database_url.as_deref().unwrap_or("(unset, mock mode)");
        let secret = if self.database_secret.is_some() {
            "****"
        } else {
            "(unset)"
        };
        let bucket = self.storage_bucket.as_deref().unwrap_or("(unset)");

        tracing::info!("Configuration loaded:");
        tracing::info!("  FIREBASE_DATABASE_URL    : {}", database_url);
        tracing::info!("  FIREBASE_DATABASE_SECRET : {}", secret);
        tracing::info!("  FIREBASE_STORAGE_BUCKET  : {}", bucket);
        tracing::info!("  FALLS_PATH               : {}", self.falls_path);
        tracing::info!("  DASHBOARD_PORT           : {}", self.port);
        tracing::info!("  DEFAULT_PER_PAGE         : {}", self.default_per_page);
    }
}
