//! eBay marketplace API client.
//!
//! Covers the OAuth authorization-code flow (consent URL, code exchange,
//! token refresh) and thin read-only wrappers over the Sell Fulfillment,
//! Inventory and Analytics REST APIs.
//!
//! # Architecture
//!
//! - The client holds application credentials only; user tokens live in
//!   `backoffice.ebay_token` and are passed in per call
//! - Token freshness is handled by [`crate::services::ebay`] before each call
//! - Optional integration: without `EBAY_*` configuration the rest of the
//!   back office works and the eBay endpoints answer 503

pub mod auth;
pub mod client;
pub mod types;

pub use auth::EbayToken;
pub use client::EbayClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to eBay.
#[derive(Debug, Error)]
pub enum EbayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Access token rejected (expired or revoked).
    #[error("eBay rejected the access token")]
    Unauthorized,

    /// Rate limited by eBay.
    #[error("Rate limited{}", .0.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    RateLimited(Option<u64>),

    /// Non-success response from a REST endpoint.
    #[error("eBay API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// First error message eBay returned.
        message: String,
    },

    /// The token endpoint refused a grant.
    #[error("OAuth error: {error}{}", .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    OAuth {
        /// OAuth error code, e.g. `invalid_grant`.
        error: String,
        /// Human readable description, if eBay sent one.
        description: Option<String>,
    },

    /// Response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        assert_eq!(
            EbayError::RateLimited(Some(30)).to_string(),
            "Rate limited, retry after 30 seconds"
        );
        assert_eq!(EbayError::RateLimited(None).to_string(), "Rate limited");
    }

    #[test]
    fn test_oauth_error_display() {
        let err = EbayError::OAuth {
            error: "invalid_grant".to_string(),
            description: Some("code expired".to_string()),
        };
        assert_eq!(err.to_string(), "OAuth error: invalid_grant (code expired)");
    }
}
