//! Remote API clients
//!
//! This module holds the HTTP surface of the crate:
//! - Building the HTTP client shared by every outbound call
//! - Submitting URL change notifications to the indexing endpoint
//! - Querying coverage through the inspection endpoint

mod indexing;
mod inspection;

pub use indexing::IndexingClient;
pub use inspection::{derive_status, Inspection, InspectionClient};

use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client used for all outbound calls
///
/// Every remote call (token exchange, submission, inspection) runs with a
/// fixed 30-second request timeout; the timeout is the only bound on call
/// duration, there is no internal retry.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("index-relay/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
}
