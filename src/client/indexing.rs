//! Indexing submission client
//!
//! Submits URL change notifications to the indexing endpoint and records the
//! outcome in the submission log. The return contract is asymmetric on
//! purpose: an ordinary API-level rejection (any non-200 response) is a
//! `false` *result*, while configuration, credential, and transport failures
//! are errors. Callers must check the boolean, not assume an `Ok` means the
//! submission was accepted.

use crate::auth::{Scope, TokenCache};
use crate::config::Settings;
use crate::state::{ActionType, IndexStatus, SubmissionSource};
use crate::store::{NewLogEntry, SharedItemStore, SharedLogSink};
use crate::{RelayError, Result};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;

/// Client for the URL notification endpoint
pub struct IndexingClient {
    http: Client,
    settings: Arc<Settings>,
    tokens: Arc<TokenCache>,
    store: SharedItemStore,
    log: SharedLogSink,
}

impl IndexingClient {
    /// Creates a new indexing client
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client
    /// * `settings` - Immutable settings snapshot
    /// * `tokens` - Token cache shared with other clients
    /// * `store` - Item store for post-success write-back
    /// * `log` - Submission log sink
    pub fn new(
        http: Client,
        settings: Arc<Settings>,
        tokens: Arc<TokenCache>,
        store: SharedItemStore,
        log: SharedLogSink,
    ) -> Self {
        Self {
            http,
            settings,
            tokens,
            store,
            log,
        }
    }

    /// Submits a URL change notification
    ///
    /// On HTTP 200 the item (given or resolved from the URL) is marked
    /// in-index with fresh checked/submitted timestamps. That means
    /// "submitted successfully", not "confirmed indexed"; an inspection is
    /// what verifies the latter.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to notify about
    /// * `action` - Update or delete notification
    /// * `source` - How this submission was triggered
    /// * `item_id` - Item to update on success; resolved from the URL when
    ///   absent
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The endpoint accepted the notification
    /// * `Ok(false)` - The endpoint rejected it (the rejection is logged
    ///   with its status code and body)
    /// * `Err(_)` - Configuration, credential, token, or transport failure,
    ///   logged with status code 0 before returning
    pub async fn submit(
        &self,
        url: &str,
        action: ActionType,
        source: SubmissionSource,
        item_id: Option<i64>,
    ) -> Result<bool> {
        let raw_json = match self.settings.service_account_json.as_deref() {
            Some(json) => json,
            None => {
                self.log_entry(url, 0, "Service account credentials not configured.", action, source);
                return Err(RelayError::MissingCredentials);
            }
        };

        let token = match self.tokens.access_token(raw_json, Scope::Indexing).await {
            Ok(token) => token,
            Err(e) => {
                self.log_entry(url, 0, &e.to_string(), action, source);
                return Err(e);
            }
        };

        let body = serde_json::json!({
            "url": url,
            "type": action.as_wire_str(),
        });

        let response = match self
            .http
            .post(&self.settings.indexing_url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.log_entry(url, 0, &e.to_string(), action, source);
                return Err(e.into());
            }
        };

        let status_code = response.status().as_u16();
        let response_body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                self.log_entry(url, 0, &e.to_string(), action, source);
                return Err(e.into());
            }
        };

        if status_code == 200 {
            self.log_entry(url, 200, "Successfully submitted for indexing.", action, source);
            self.record_success(url, item_id);
            Ok(true)
        } else {
            self.log_entry(url, status_code, &response_body, action, source);
            Ok(false)
        }
    }

    /// Marks the submitted item in-index with fresh timestamps
    ///
    /// Store failures here don't fail the submission (the remote side
    /// already accepted it), so they are traced and swallowed.
    fn record_success(&self, url: &str, item_id: Option<i64>) {
        let now = Utc::now();
        let mut store = self.store.lock().unwrap();

        let resolved = match item_id {
            Some(id) => Some(id),
            None => match store.resolve_item_id(url) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!("Failed to resolve item for {}: {}", url, e);
                    None
                }
            },
        };

        let Some(id) = resolved else {
            return;
        };

        let result = store
            .set_status(id, IndexStatus::InIndex)
            .and_then(|_| store.set_last_checked(id, now))
            .and_then(|_| store.set_last_submitted(id, now));
        if let Err(e) = result {
            tracing::warn!("Failed to record submission for item {}: {}", id, e);
        }
    }

    /// Appends an entry to the submission log, tracing append failures
    fn log_entry(
        &self,
        url: &str,
        status_code: u16,
        message: &str,
        action: ActionType,
        source: SubmissionSource,
    ) {
        let entry = NewLogEntry {
            url,
            status_code,
            message,
            action,
            source,
        };
        let mut log = self.log.lock().unwrap();
        if let Err(e) = log.append(&entry) {
            tracing::warn!("Failed to append submission log for {}: {}", url, e);
        }
    }
}
