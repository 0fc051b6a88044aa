//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::path::PathBuf;
use std::time::Duration;

use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the backend REST API, without a trailing slash.
    pub api_base_url: String,
    /// Directory for the profile store and log file.
    pub data_dir: PathBuf,
    /// Directory chat exports are written to.
    pub export_dir: PathBuf,
    pub log_level: Level,
    /// Interval between document-status polls while a document is processing.
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure tests
    /// are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_base_url = std::env::var("DOCLENS_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        let data_dir = match std::env::var("DOCLENS_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .map(|base| base.join("doclens"))
                .ok_or_else(|| ConfigError::MissingVar("DOCLENS_DATA_DIR".to_string()))?,
        };

        let export_dir = match std::env::var("DOCLENS_EXPORT_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::download_dir().unwrap_or_else(|| data_dir.clone()),
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let poll_interval_ms = match std::env::var("DOCLENS_POLL_INTERVAL_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("DOCLENS_POLL_INTERVAL_MS".to_string(), e.to_string())
            })?,
            Err(_) => 3_000,
        };

        let request_timeout_secs = match std::env::var("DOCLENS_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue(
                    "DOCLENS_REQUEST_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            api_base_url,
            data_dir,
            export_dir,
            log_level,
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}
