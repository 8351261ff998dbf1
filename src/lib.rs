//! Index-Relay: a search-engine indexing submitter and status checker
//!
//! This crate submits page URLs to the Google Indexing API, checks their
//! coverage through the URL Inspection API, and runs a rate-limited batch
//! scan that re-verifies tracked items without exceeding the external quota.

pub mod auth;
pub mod client;
pub mod config;
pub mod scheduler;
pub mod state;
pub mod store;

use thiserror::Error;

/// Main error type for Index-Relay operations
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Service account credentials not configured")]
    MissingCredentials,

    #[error("Site URL not configured and could not be derived")]
    MissingSiteUrl,

    #[error("Invalid service account credentials: {0}")]
    Credential(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    #[error("Failed to get access token: {0}")]
    TokenExchange(String),

    #[error("Inspection failed: {0}")]
    Inspection(String),

    #[error("Unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("Store error: {0}")]
    StoreError(#[from] store::StoreError),

    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to read service account file {path}: {source}")]
    CredentialFile {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for Index-Relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, Settings};
pub use state::{ActionType, IndexStatus, SubmissionSource};
