use crate::config::types::{Config, SiteConfig, StoreConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_credentials(config)?;
    validate_site(&config.site)?;
    validate_scan(config)?;
    validate_endpoints(config)?;
    validate_store(&config.store)?;
    Ok(())
}

/// Validates the credentials section
fn validate_credentials(config: &Config) -> Result<(), ConfigError> {
    if let Some(path) = &config.credentials.service_account_path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "service-account-path cannot be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates the site section
fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    if let Some(site_url) = &site.site_url {
        Url::parse(site_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site-url: {}", e)))?;
    }

    if let Some(home_url) = &site.home_url {
        Url::parse(home_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid home-url: {}", e)))?;
    }

    Ok(())
}

/// Validates the scan section
fn validate_scan(config: &Config) -> Result<(), ConfigError> {
    for item_type in &config.scan.item_types {
        if item_type.is_empty() {
            return Err(ConfigError::Validation(
                "item-types entries cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates the endpoints section
fn validate_endpoints(config: &Config) -> Result<(), ConfigError> {
    Url::parse(&config.endpoints.indexing_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid indexing-url: {}", e)))?;
    Url::parse(&config.endpoints.inspection_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid inspection-url: {}", e)))?;
    Ok(())
}

/// Validates the store section
fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    if store.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}
