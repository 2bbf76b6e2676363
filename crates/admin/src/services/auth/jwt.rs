//! HS256 access tokens.
//!
//! Tokens carry the user id and email so requests can be authenticated
//! without a database round trip.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use stockroom_core::{Email, UserId};

use super::AuthError;
use crate::models::CurrentUser;

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub email: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// The caller these claims identify.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the embedded email does not parse.
    pub fn current_user(&self) -> Result<CurrentUser, AuthError> {
        let email =
            Email::parse(&self.email).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(CurrentUser {
            id: UserId::new(self.sub),
            email,
        })
    }
}

/// Signing and verification keys derived from `BACKOFFICE_JWT_SECRET`.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl JwtKeys {
    /// Build keys from the shared secret and a token lifetime in hours.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl_secs: ttl_hours * 3600,
        }
    }

    /// Token lifetime in seconds (also used as the cookie max-age).
    #[must_use]
    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue(&self, user_id: UserId, email: &Email) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.as_i32(),
            email: email.as_str().to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }

    /// Check a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is malformed, signed
    /// with another key, or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&SecretString::from(secret.to_string()), 24)
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys("k3y-for-tests-Xq9#Lm2$Vb7!Np4&Rt8");
        let email = Email::parse("Owner@Example.com").unwrap();
        let token = keys.issue(UserId::new(42), &email).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);

        let user = claims.current_user().unwrap();
        assert_eq!(user.id, UserId::new(42));
        assert_eq!(user.email.as_str(), "owner@example.com");
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let email = Email::parse("a@example.com").unwrap();
        let token = keys("first-secret-Xq9#Lm2$Vb7!Np4&Rt8zz")
            .issue(UserId::new(1), &email)
            .unwrap();
        let err = keys("second-secret-Xq9#Lm2$Vb7!Np4&Rt8z")
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let keys = keys("k3y-for-tests-Xq9#Lm2$Vb7!Np4&Rt8");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "a@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(keys("k3y-for-tests-Xq9#Lm2$Vb7!Np4&Rt8").verify("not.a.jwt").is_err());
    }
}
