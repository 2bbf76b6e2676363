//! Authentication extractors and the token cookie.
//!
//! A request is authenticated by an HS256 token, read from the
//! `Authorization: Bearer` header first and the `sr_token` cookie second.
//! Pages get the cookie on login; scripts and API clients may use either.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use crate::error::set_sentry_user;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Name of the cookie holding the access token.
pub const AUTH_COOKIE_NAME: &str = "sr_token";

/// Extractor that requires an authenticated user.
///
/// If the token is missing or invalid, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but missing.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized(&'static str),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = is_api_request(parts);
        let reject = |message| {
            if is_api {
                AuthRejection::Unauthorized(message)
            } else {
                AuthRejection::RedirectToLogin
            }
        };

        let token = token_from_headers(&parts.headers).ok_or_else(|| reject("Not logged in"))?;

        let user = state
            .jwt()
            .verify(&token)
            .and_then(|claims| claims.current_user())
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                reject("Invalid or expired token")
            })?;

        set_sentry_user(user.id.as_i32(), user.email.as_str());
        Ok(Self(user))
    }
}

/// Whether the request targets the JSON API. Nested routers see the path
/// with their prefix stripped, so the original URI is checked first.
fn is_api_request(parts: &Parts) -> bool {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0)
        .path()
        .starts_with("/api/")
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if there is no
/// valid token.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = token_from_headers(&parts.headers)
            .and_then(|token| state.jwt().verify(&token).ok())
            .and_then(|claims| claims.current_user().ok());

        Ok(Self(user))
    }
}

/// Bearer token if present, else the token cookie.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == AUTH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Cookie carrying a freshly issued token.
#[must_use]
pub fn auth_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Cookie that removes the token.
#[must_use]
pub fn clear_auth_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("sr_token=def"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_cookie_is_used_without_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("sr_session=xyz; sr_token=def; theme=dark"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("sr_token="));
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_api_detection_prefers_original_uri() {
        let (mut parts, ()) = axum::http::Request::builder()
            .uri("/expenses")
            .body(())
            .unwrap()
            .into_parts();
        assert!(!is_api_request(&parts));

        parts
            .extensions
            .insert(OriginalUri("/api/expenses".parse().unwrap()));
        assert!(is_api_request(&parts));
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie("tok".to_string(), 3600, true).to_string();
        assert!(cookie.starts_with("sr_token=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));

        let cleared = clear_auth_cookie(false).to_string();
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
