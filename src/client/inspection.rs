//! URL inspection client
//!
//! Queries the inspection endpoint for a URL's coverage and folds the
//! response, whose shape varies between deployments, into a tri-state
//! status through an ordered fallback chain. The chain degrades to
//! `Unknown` rather than erroring on an unrecognized shape: availability
//! over strict typing.

use crate::auth::{Scope, TokenCache};
use crate::config::Settings;
use crate::state::IndexStatus;
use crate::store::SharedItemStore;
use crate::{RelayError, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

/// Result of one inspection call
#[derive(Debug)]
pub struct Inspection {
    /// Derived tri-state status
    pub status: IndexStatus,

    /// When the inspection completed
    pub checked_at: DateTime<Utc>,

    /// The raw response, for callers that display remote details
    pub raw: Value,
}

/// Client for the URL inspection endpoint
pub struct InspectionClient {
    http: Client,
    settings: Arc<Settings>,
    tokens: Arc<TokenCache>,
    store: SharedItemStore,
}

impl InspectionClient {
    /// Creates a new inspection client
    pub fn new(
        http: Client,
        settings: Arc<Settings>,
        tokens: Arc<TokenCache>,
        store: SharedItemStore,
    ) -> Self {
        Self {
            http,
            settings,
            tokens,
            store,
        }
    }

    /// Inspects a URL's coverage state
    ///
    /// When `item_id` is given, the derived status and a fresh checked
    /// timestamp are written back on every completed call; an `Unknown`
    /// overwrites a previously known status. See DESIGN.md for the open
    /// question on that overwrite.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to inspect
    /// * `item_id` - Item to write the result back to
    ///
    /// # Returns
    ///
    /// * `Ok(Inspection)` - Derived status plus the raw response
    /// * `Err(RelayError::MissingCredentials)` - No credential configured
    /// * `Err(RelayError::MissingSiteUrl)` - No site URL configured or
    ///   derivable
    /// * `Err(RelayError::Inspection)` - The endpoint answered non-200
    /// * `Err(RelayError::ResponseFormat)` - The body was not JSON
    pub async fn inspect(&self, url: &str, item_id: Option<i64>) -> Result<Inspection> {
        let raw_json = self
            .settings
            .service_account_json
            .as_deref()
            .ok_or(RelayError::MissingCredentials)?;

        let site_url = self
            .settings
            .site_url
            .as_deref()
            .ok_or(RelayError::MissingSiteUrl)?;

        let token = self
            .tokens
            .access_token(raw_json, Scope::WebmastersReadOnly)
            .await?;

        let body = serde_json::json!({
            "inspectionUrl": url,
            "siteUrl": site_url,
        });

        let response = self
            .http
            .post(&self.settings.inspection_url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let response_body = response.text().await?;

        if status_code != 200 {
            return Err(RelayError::Inspection(response_body));
        }

        let data: Value = serde_json::from_str(&response_body).map_err(|_| {
            RelayError::ResponseFormat("inspection response is not valid JSON".to_string())
        })?;

        let status = derive_status(&data);
        let checked_at = Utc::now();

        if let Some(id) = item_id {
            self.write_back(id, status, checked_at);
        }

        Ok(Inspection {
            status,
            checked_at,
            raw: data,
        })
    }

    /// Writes the derived status and checked timestamp to the item
    fn write_back(&self, item_id: i64, status: IndexStatus, checked_at: DateTime<Utc>) {
        let mut store = self.store.lock().unwrap();
        let result = store
            .set_status(item_id, status)
            .and_then(|_| store.set_last_checked(item_id, checked_at));
        if let Err(e) = result {
            tracing::warn!("Failed to record inspection for item {}: {}", item_id, e);
        }
    }
}

/// Derives the tri-state status from an inspection response
///
/// Ordered fallback chain; each step runs only when the previous one was
/// inconclusive:
///
/// 1. `indexStatusResult.coverageState`, the most reliable field
/// 2. `indexStatusResult.verdict`
/// 3. a non-empty `indexStatusResult.lastCrawlTime` (crawled implies
///    indexed)
/// 4. a direct `inspectionResult.indexStatus` (alternate response shape)
/// 5. otherwise `Unknown`
pub fn derive_status(data: &Value) -> IndexStatus {
    let inspection_result = match data.get("inspectionResult") {
        Some(result) => result,
        None => return IndexStatus::Unknown,
    };

    if let Some(result) = inspection_result.get("indexStatusResult") {
        if let Some(coverage) = result.get("coverageState").and_then(Value::as_str) {
            match coverage {
                "SUBMITTED_AND_INDEXED" | "INDEXED" => return IndexStatus::InIndex,
                "NOT_INDEXED" | "EXCLUDED" => return IndexStatus::NotInIndex,
                _ => {}
            }
        }

        if let Some(verdict) = result.get("verdict").and_then(Value::as_str) {
            match verdict {
                "PASS" => return IndexStatus::InIndex,
                "FAIL" | "PARTIAL" | "NEUTRAL" => return IndexStatus::NotInIndex,
                _ => {}
            }
        }

        let crawled = result
            .get("lastCrawlTime")
            .and_then(Value::as_str)
            .map_or(false, |t| !t.is_empty());
        if crawled {
            return IndexStatus::InIndex;
        }
    }

    if let Some(direct) = inspection_result.get("indexStatus").and_then(Value::as_str) {
        match direct {
            "INDEXED" | "SUBMITTED_AND_INDEXED" => return IndexStatus::InIndex,
            "NOT_INDEXED" => return IndexStatus::NotInIndex,
            _ => {}
        }
    }

    IndexStatus::Unknown
}
