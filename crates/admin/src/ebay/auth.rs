//! eBay OAuth tokens.
//!
//! eBay issues user access tokens valid for two hours and refresh tokens
//! valid for about eighteen months. A refresh grant returns a new access
//! token only; the refresh token carries over unchanged.

use secrecy::SecretString;
use serde::Deserialize;

use super::EbayError;

/// Seconds before expiry at which an access token is treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// A user's eBay OAuth tokens.
#[derive(Debug, Clone)]
pub struct EbayToken {
    /// Bearer token for REST calls.
    pub access_token: SecretString,
    /// Long-lived token for obtaining new access tokens.
    pub refresh_token: Option<SecretString>,
    /// Unix timestamp when the access token expires.
    pub access_token_expires_at: i64,
    /// Unix timestamp when the refresh token expires (if known).
    pub refresh_token_expires_at: Option<i64>,
}

/// Successful response from the token endpoint.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    /// Access token lifetime in seconds.
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Refresh token lifetime in seconds.
    #[serde(default)]
    refresh_token_expires_in: Option<i64>,
}

/// Error response from the token endpoint.
#[derive(Deserialize)]
pub(crate) struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenResponse {
    /// Convert to a token, anchoring lifetimes at `now` (unix seconds).
    pub(crate) fn into_token(self, now: i64) -> EbayToken {
        EbayToken {
            access_token: SecretString::from(self.access_token),
            refresh_token: self.refresh_token.map(SecretString::from),
            access_token_expires_at: now + self.expires_in,
            refresh_token_expires_at: self.refresh_token_expires_in.map(|secs| now + secs),
        }
    }
}

impl TokenErrorResponse {
    pub(crate) fn into_error(self, status: u16) -> EbayError {
        EbayError::OAuth {
            error: self.error.unwrap_or_else(|| format!("http_{status}")),
            description: self.error_description,
        }
    }
}

impl EbayToken {
    /// Check if the access token has expired (with a 60 second margin).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_within(EXPIRY_SKEW_SECS)
    }

    /// Check if the access token will expire within the given number of seconds.
    #[must_use]
    pub fn expires_within(&self, seconds: i64) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.access_token_expires_at - seconds
    }

    /// Check if a refresh token is available and not expired.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
            && self.refresh_token_expires_at.is_none_or(|expires_at| {
                let now = chrono::Utc::now().timestamp();
                now < expires_at - EXPIRY_SKEW_SECS
            })
    }

    /// Carry the previous refresh token over when a refresh grant omits one.
    #[must_use]
    pub fn inherit_refresh_token(mut self, previous: &Self) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token.clone_from(&previous.refresh_token);
            self.refresh_token_expires_at = previous.refresh_token_expires_at;
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn token(expires_in: i64, refresh: Option<(&str, Option<i64>)>) -> EbayToken {
        let now = chrono::Utc::now().timestamp();
        EbayToken {
            access_token: SecretString::from("access"),
            refresh_token: refresh.map(|(t, _)| SecretString::from(t)),
            access_token_expires_at: now + expires_in,
            refresh_token_expires_at: refresh.and_then(|(_, at)| at.map(|secs| now + secs)),
        }
    }

    #[test]
    fn test_token_is_expired() {
        assert!(token(-3600, None).is_expired());
        assert!(!token(3600, None).is_expired());
        // inside the 60 second margin
        assert!(token(30, None).is_expired());
    }

    #[test]
    fn test_expires_within() {
        let t = token(240, None);
        assert!(t.expires_within(300));
        assert!(!t.expires_within(120));
    }

    #[test]
    fn test_can_refresh() {
        assert!(token(-1, Some(("r", Some(86_400)))).can_refresh());
        assert!(token(-1, Some(("r", None))).can_refresh());
        assert!(!token(-1, Some(("r", Some(-10)))).can_refresh());
        assert!(!token(-1, None).can_refresh());
    }

    #[test]
    fn test_token_response_lifetimes() {
        let json = r#"{
            "access_token": "v^1.1#abc",
            "expires_in": 7200,
            "refresh_token": "v^1.1#def",
            "refresh_token_expires_in": 47304000,
            "token_type": "User Access Token"
        }"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        let token = response.into_token(1_000);
        assert_eq!(token.access_token.expose_secret(), "v^1.1#abc");
        assert_eq!(token.access_token_expires_at, 8_200);
        assert_eq!(token.refresh_token_expires_at, Some(47_305_000));
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let previous = token(-10, Some(("old-refresh", Some(86_400))));
        let json = r#"{"access_token":"fresh","expires_in":7200}"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        let refreshed = response.into_token(0).inherit_refresh_token(&previous);
        assert_eq!(
            refreshed.refresh_token.unwrap().expose_secret(),
            "old-refresh"
        );
        assert_eq!(
            refreshed.refresh_token_expires_at,
            previous.refresh_token_expires_at
        );
    }

    #[test]
    fn test_token_error_response() {
        let json = r#"{"error":"invalid_grant","error_description":"the code has expired"}"#;
        let response: TokenErrorResponse = serde_json::from_str(json).unwrap();
        match response.into_error(400) {
            EbayError::OAuth { error, description } => {
                assert_eq!(error, "invalid_grant");
                assert_eq!(description.as_deref(), Some("the code has expired"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_token_debug_redacts_secret() {
        let debug = format!("{:?}", token(10, Some(("refresh-secret", None))));
        assert!(!debug.contains("refresh-secret"));
    }
}
