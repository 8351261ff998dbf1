use crate::state::ActionType;
use serde::Deserialize;

/// Default OAuth token endpoint, used when the service account JSON carries
/// no `token_uri` of its own.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Default URL notification endpoint of the Indexing API.
pub const DEFAULT_INDEXING_ENDPOINT: &str =
    "https://indexing.googleapis.com/v3/urlNotifications:publish";

/// Default URL Inspection endpoint of the Search Console API.
pub const DEFAULT_INSPECTION_ENDPOINT: &str =
    "https://searchconsole.googleapis.com/v1/urlInspection/index:inspect";

/// Main configuration structure for Index-Relay
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub site: SiteConfig,
    pub scan: ScanConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    pub store: StoreConfig,
}

/// Service account credential configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Path to the service account JSON file. Absent means submissions and
    /// inspections fail with a configuration error until one is provided.
    #[serde(rename = "service-account-path")]
    pub service_account_path: Option<String>,
}

/// Site identification for the inspection endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    /// Explicit Search Console property URL
    #[serde(rename = "site-url")]
    pub site_url: Option<String>,

    /// Home URL of the site; used to derive the property URL when no
    /// explicit one is configured
    #[serde(rename = "home-url")]
    pub home_url: Option<String>,
}

/// Scheduled scan configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Whether the scheduled scan processes anything at all
    #[serde(default)]
    pub enabled: bool,

    /// Scan speed tier, mapped to a per-tick batch size
    #[serde(default)]
    pub speed: ScanSpeed,

    /// Item types eligible for scanning; an empty list disables the scan
    #[serde(rename = "item-types", default)]
    pub item_types: Vec<String>,

    /// Action type used by publish-triggered submissions
    #[serde(rename = "default-action", default = "default_action")]
    pub default_action: String,
}

fn default_action() -> String {
    "URL_UPDATED".to_string()
}

/// Scan speed tiers and their per-tick batch sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl ScanSpeed {
    /// Number of items inspected per scheduler tick
    ///
    /// The external quota is roughly 2,000 requests/day; with an hourly
    /// tick even the fast tier stays comfortably inside it.
    pub fn batch_size(&self) -> usize {
        match self {
            Self::Slow => 20,
            Self::Medium => 50,
            Self::Fast => 100,
        }
    }
}

/// Remote API endpoints
///
/// Overridable so tests and proxies can point at a local server. The token
/// endpoint is not listed here: it belongs to the credential (`token_uri`).
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    #[serde(rename = "indexing-url", default = "default_indexing_url")]
    pub indexing_url: String,

    #[serde(rename = "inspection-url", default = "default_inspection_url")]
    pub inspection_url: String,
}

fn default_indexing_url() -> String {
    DEFAULT_INDEXING_ENDPOINT.to_string()
}

fn default_inspection_url() -> String {
    DEFAULT_INSPECTION_ENDPOINT.to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            indexing_url: default_indexing_url(),
            inspection_url: default_inspection_url(),
        }
    }
}

/// Local store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Immutable settings snapshot resolved from a [`Config`]
///
/// One snapshot is built per process (or per tick by an external caller) and
/// shared by reference with every component, replacing scattered
/// configuration reads. `Debug` redacts the credential material; use the
/// fingerprint to refer to a credential in logs.
#[derive(Clone)]
pub struct Settings {
    /// Raw service account JSON, if configured. Kept as the original bytes
    /// so the credential cache can compare it byte-for-byte.
    pub service_account_json: Option<String>,

    /// Hex SHA-256 of the raw credential blob; safe to log
    pub credential_fingerprint: Option<String>,

    /// Resolved Search Console property URL with exactly one trailing slash
    pub site_url: Option<String>,

    pub scan_enabled: bool,
    pub scan_speed: ScanSpeed,
    pub item_types: Vec<String>,
    pub default_action: ActionType,

    pub indexing_url: String,
    pub inspection_url: String,

    pub database_path: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field(
                "service_account_json",
                &self.service_account_json.as_ref().map(|_| "<redacted>"),
            )
            .field("credential_fingerprint", &self.credential_fingerprint)
            .field("site_url", &self.site_url)
            .field("scan_enabled", &self.scan_enabled)
            .field("scan_speed", &self.scan_speed)
            .field("item_types", &self.item_types)
            .field("default_action", &self.default_action)
            .field("indexing_url", &self.indexing_url)
            .field("inspection_url", &self.inspection_url)
            .field("database_path", &self.database_path)
            .finish()
    }
}

/// Resolves the Search Console property URL from the site configuration
///
/// An explicit `site-url` wins; otherwise the property URL is derived from
/// `home-url` by keeping scheme and host only. Either way the result carries
/// exactly one trailing slash, which is what the inspection endpoint expects
/// for URL-prefix properties.
pub fn resolve_site_url(site: &SiteConfig) -> Option<String> {
    if let Some(configured) = &site.site_url {
        if !configured.is_empty() {
            return Some(with_single_trailing_slash(configured));
        }
    }

    let home = site.home_url.as_deref()?;
    let parsed = url::Url::parse(home).ok()?;
    let host = parsed.host_str()?;
    Some(with_single_trailing_slash(&format!(
        "{}://{}",
        parsed.scheme(),
        host
    )))
}

fn with_single_trailing_slash(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}
