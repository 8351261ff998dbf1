//! Credential handling and token acquisition
//!
//! This module turns a long-lived service account credential into the
//! short-lived bearer tokens the remote APIs expect: parsing the credential
//! JSON, signing the OAuth JWT assertion, and exchanging it for an access
//! token.

mod credentials;
mod signer;
mod token;

pub use credentials::ServiceAccountKey;
pub use signer::{signed_assertion, Scope, TOKEN_TTL_SECS};
pub use token::TokenCache;
