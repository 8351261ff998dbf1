//! Configuration module for Index-Relay
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and resolving them into the immutable settings snapshot passed to
//! every component.
//!
//! # Example
//!
//! ```no_run
//! use index_relay::config::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("config.toml")).unwrap();
//! println!("Scan batch size: {}", settings.scan_speed.batch_size());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CredentialsConfig, EndpointConfig, ScanConfig, ScanSpeed, Settings, SiteConfig,
    StoreConfig, DEFAULT_INDEXING_ENDPOINT, DEFAULT_INSPECTION_ENDPOINT, DEFAULT_TOKEN_ENDPOINT,
};

// Re-export parser functions
pub use parser::{load_config, load_settings, resolve_settings, sha256_hex};
