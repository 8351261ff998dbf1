//! Access token acquisition
//!
//! Exchanges a signed assertion for a bearer token at the credential's token
//! endpoint. Only the *parsed credential* is cached (single slot, keyed on
//! byte equality of the raw JSON); the token itself is fetched fresh on
//! every call, exactly as the submission path has always worked. See
//! DESIGN.md for the open question on caching tokens until expiry.

use crate::auth::credentials::ServiceAccountKey;
use crate::auth::signer::{signed_assertion, Scope};
use crate::RelayError;
use chrono::Utc;
use reqwest::Client;
use std::sync::{Arc, Mutex};

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Single-slot credential cache entry
struct CachedCredentials {
    raw: String,
    key: Arc<ServiceAccountKey>,
}

/// Acquires bearer tokens for a credential and scope
///
/// Concurrent triggers (a publish event racing a scheduled tick) may call
/// this from different tasks; the slot's read-modify-write is mutex-guarded.
/// The lock is never held across network I/O.
pub struct TokenCache {
    http: Client,
    slot: Mutex<Option<CachedCredentials>>,
}

impl TokenCache {
    /// Creates a token cache using the given HTTP client
    pub fn new(http: Client) -> Self {
        Self {
            http,
            slot: Mutex::new(None),
        }
    }

    /// Acquires an access token for the given credential material and scope
    ///
    /// The raw JSON is compared byte-for-byte against the cached slot; the
    /// credential is reparsed only when the material changed. A token
    /// exchange is performed on every call regardless.
    ///
    /// # Arguments
    ///
    /// * `raw_json` - The service account JSON blob
    /// * `scope` - The access scope to request
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The bearer token string
    /// * `Err(RelayError::Credential)` - Credential material is malformed
    /// * `Err(RelayError::Signing)` - Assertion could not be signed
    /// * `Err(RelayError::TokenExchange)` - The endpoint rejected the request
    ///   or answered with no `access_token` field
    /// * `Err(RelayError::Transport)` - Network-level failure
    pub async fn access_token(&self, raw_json: &str, scope: Scope) -> Result<String, RelayError> {
        let key = self.cached_key(raw_json)?;

        let assertion = signed_assertion(&key, scope, Utc::now())?;

        let response = self
            .http
            .post(key.token_uri())
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() != 200 {
            return Err(RelayError::TokenExchange(body));
        }

        let data: serde_json::Value = serde_json::from_str(&body)
            .map_err(|_| RelayError::TokenExchange("invalid token response".to_string()))?;

        match data.get("access_token").and_then(|v| v.as_str()) {
            Some(token) => Ok(token.to_string()),
            None => Err(RelayError::TokenExchange(
                "invalid token response".to_string(),
            )),
        }
    }

    /// Returns the parsed credential for the given raw material, reparsing
    /// only when the material differs from the cached slot
    fn cached_key(&self, raw_json: &str) -> Result<Arc<ServiceAccountKey>, RelayError> {
        let mut slot = self.slot.lock().unwrap();

        if let Some(cached) = slot.as_ref() {
            if cached.raw == raw_json {
                return Ok(Arc::clone(&cached.key));
            }
        }

        // Parsing is idempotent and side-effect-free, so a racing reparse
        // would be redundant but harmless.
        let key = Arc::new(ServiceAccountKey::parse(raw_json)?);
        *slot = Some(CachedCredentials {
            raw: raw_json.to_string(),
            key: Arc::clone(&key),
        });

        Ok(key)
    }
}
