use crate::config::types::{resolve_site_url, Config, Settings};
use crate::config::validation::validate;
use crate::state::ActionType;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a hex-encoded SHA-256 digest of the given bytes
///
/// Used to fingerprint credential material so it can be referenced in logs
/// without ever logging the material itself.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Resolves a parsed configuration into an immutable [`Settings`] snapshot
///
/// Reads the service account file (when one is configured) and resolves the
/// site URL. A configured-but-unreadable credential file is an error; an
/// absent `service-account-path` is not, since the credential check happens
/// at call time and the scan and log surfaces keep working without one.
pub fn resolve_settings(config: &Config) -> Result<Settings, ConfigError> {
    let service_account_json = match &config.credentials.service_account_path {
        Some(path) => Some(std::fs::read_to_string(path).map_err(|source| {
            ConfigError::CredentialFile {
                path: path.clone(),
                source,
            }
        })?),
        None => None,
    };

    let credential_fingerprint = service_account_json
        .as_deref()
        .map(|json| sha256_hex(json.as_bytes()));

    Ok(Settings {
        site_url: resolve_site_url(&config.site),
        scan_enabled: config.scan.enabled,
        scan_speed: config.scan.speed,
        item_types: config.scan.item_types.clone(),
        default_action: ActionType::from_str_lossy(&config.scan.default_action),
        indexing_url: config.endpoints.indexing_url.clone(),
        inspection_url: config.endpoints.inspection_url.clone(),
        database_path: config.store.database_path.clone(),
        service_account_json,
        credential_fingerprint,
    })
}

/// Loads a configuration file and resolves it into a settings snapshot
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Settings)` - Resolved snapshot ready to hand to components
/// * `Err(ConfigError)` - Failed to load, parse, validate, or resolve
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let config = load_config(path)?;
    resolve_settings(&config)
}
