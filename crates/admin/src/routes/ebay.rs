//! eBay connection and read-only marketplace data.
//!
//! `/ebay/connect` and `/ebay/callback` are browser redirects; everything
//! else is JSON under `/api/ebay`.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{Days, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::EbayEnvironment;
use stockroom_core::validation::{ValidationError, require_date_order};

use crate::db::EbayTokenRepository;
use crate::ebay::{InventoryItemsPage, OrdersPage};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{EbayOAuthState, session_keys};
use crate::services::EbayService;
use crate::state::AppState;

/// Page size when a request does not ask for one.
const DEFAULT_LIMIT: u32 = 50;

/// Days covered by a traffic report without explicit dates.
const DEFAULT_TRAFFIC_DAYS: u64 = 30;

/// Build the `/api/ebay` router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/ebay/status", get(status))
        .route("/ebay/disconnect", post(disconnect))
        .route("/ebay/orders", get(orders))
        .route("/ebay/listings", get(listings))
        .route("/ebay/analytics/traffic", get(traffic))
}

/// Query parameters from the eBay OAuth redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if the user declined or eBay failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// `limit` / `offset` for eBay list calls.
#[derive(Debug, Default, Deserialize)]
pub struct EbayPageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Date range of a traffic report.
#[derive(Debug, Default, Deserialize)]
pub struct TrafficQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Response of `GET /api/ebay/status`.
#[derive(Debug, Serialize)]
pub struct EbayStatus {
    pub configured: bool,
    pub connected: bool,
    pub environment: Option<EbayEnvironment>,
    pub scopes: Vec<String>,
    pub access_token_expires_at: Option<i64>,
}

/// Generate a random alphanumeric OAuth state.
fn generate_state(length: usize) -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn redirect_with_error(code: &str) -> Response {
    Redirect::to(&format!("/ebay?error={code}")).into_response()
}

/// Start the OAuth flow: remember a fresh `state` and send the browser to eBay.
///
/// GET /ebay/connect
#[instrument(skip(user, state, session), fields(user_id = %user.id))]
pub async fn connect(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    let Some(client) = state.ebay() else {
        return redirect_with_error("not_configured");
    };

    let oauth_state = EbayOAuthState {
        state: generate_state(32),
        user_id: user.id,
    };

    if let Err(e) = session
        .insert(session_keys::EBAY_OAUTH_STATE, &oauth_state)
        .await
    {
        tracing::error!(error = %e, "Failed to store eBay OAuth state in session");
        return redirect_with_error("session");
    }

    match client.authorization_url(&oauth_state.state) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build eBay authorization URL");
            redirect_with_error("authorize_url")
        }
    }
}

/// Finish the OAuth flow and store the tokens.
///
/// GET /ebay/callback
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let stored: Option<EbayOAuthState> = match session
        .remove(session_keys::EBAY_OAUTH_STATE)
        .await
    {
        Ok(stored) => stored,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read eBay OAuth state from session");
            return redirect_with_error("session");
        }
    };

    if let Some(error) = query.error {
        tracing::warn!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or_default(),
            "eBay authorization declined"
        );
        return redirect_with_error("denied");
    }

    let Some(stored) = stored else {
        tracing::warn!("eBay callback without a pending OAuth state");
        return redirect_with_error("missing_state");
    };

    if query.state.as_deref() != Some(stored.state.as_str()) {
        tracing::warn!(user_id = %stored.user_id, "eBay OAuth state mismatch");
        return redirect_with_error("invalid_state");
    }

    let Some(code) = query.code else {
        tracing::warn!("eBay callback missing code");
        return redirect_with_error("missing_code");
    };

    let Some(client) = state.ebay() else {
        return redirect_with_error("not_configured");
    };

    match EbayService::new(state.pool(), client)
        .connect(stored.user_id, &code)
        .await
    {
        Ok(_) => Redirect::to("/ebay?success=connected").into_response(),
        Err(e) => {
            tracing::error!(error = %e, user_id = %stored.user_id, "eBay code exchange failed");
            redirect_with_error("exchange_failed")
        }
    }
}

/// Whether eBay is configured and the caller is connected.
///
/// GET /api/ebay/status
pub async fn status(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<EbayStatus>, AppError> {
    let configured = state.ebay().is_some();
    let connection = EbayTokenRepository::new(state.pool()).get(user.id).await?;

    Ok(Json(match connection {
        Some(c) => EbayStatus {
            configured,
            connected: true,
            environment: Some(c.environment),
            scopes: c.scopes,
            access_token_expires_at: Some(c.token.access_token_expires_at),
        },
        None => EbayStatus {
            configured,
            connected: false,
            environment: None,
            scopes: Vec::new(),
            access_token_expires_at: None,
        },
    }))
}

/// Forget the caller's eBay tokens.
///
/// POST /api/ebay/disconnect
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn disconnect(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let removed = EbayTokenRepository::new(state.pool()).delete(user.id).await?;
    if removed {
        tracing::info!("eBay account disconnected");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/ebay/orders
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(page): Query<EbayPageQuery>,
) -> Result<Json<OrdersPage>, AppError> {
    let client = state.require_ebay()?;
    let token = EbayService::new(state.pool(), client)
        .access_token(user.id)
        .await?;

    let orders = client
        .get_orders(
            &token,
            page.limit.unwrap_or(DEFAULT_LIMIT),
            page.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(orders))
}

/// GET /api/ebay/listings
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn listings(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(page): Query<EbayPageQuery>,
) -> Result<Json<InventoryItemsPage>, AppError> {
    let client = state.require_ebay()?;
    let token = EbayService::new(state.pool(), client)
        .access_token(user.id)
        .await?;

    let items = client
        .get_inventory_items(
            &token,
            page.limit.unwrap_or(DEFAULT_LIMIT),
            page.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(items))
}

/// Daily listing traffic. Defaults to the 30 days ending yesterday.
///
/// GET /api/ebay/analytics/traffic
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn traffic(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<TrafficQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (start, end) = traffic_range(&query, Utc::now().date_naive())?;

    let client = state.require_ebay()?;
    let token = EbayService::new(state.pool(), client)
        .access_token(user.id)
        .await?;

    let report = client.get_traffic_report(&token, start, end).await?;
    Ok(Json(report))
}

/// Resolve the requested range against `today`.
fn traffic_range(query: &TrafficQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
    let end = match query.end {
        Some(end) => end,
        None => days_before(today, 1, "end")?,
    };
    let start = match query.start {
        Some(start) => start,
        None => days_before(end, DEFAULT_TRAFFIC_DAYS - 1, "start")?,
    };
    require_date_order("end", start, Some(end))?;
    Ok((start, end))
}

fn days_before(
    date: NaiveDate,
    days: u64,
    field: &'static str,
) -> Result<NaiveDate, ValidationError> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| ValidationError::new(field, "is out of range"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generate_state() {
        let a = generate_state(32);
        let b = generate_state(32);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_traffic_range_defaults_to_last_thirty_days() {
        let (start, end) = traffic_range(&TrafficQuery::default(), date(2026, 7, 1)).unwrap();
        assert_eq!(end, date(2026, 6, 30));
        assert_eq!(start, date(2026, 6, 1));
    }

    #[test]
    fn test_traffic_range_rejects_inverted_dates() {
        let query = TrafficQuery {
            start: Some(date(2026, 6, 10)),
            end: Some(date(2026, 6, 1)),
        };
        let err = traffic_range(&query, date(2026, 7, 1)).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_traffic_range_rejects_dates_at_the_calendar_edge() {
        let query = TrafficQuery {
            start: None,
            end: Some(NaiveDate::MIN),
        };
        let err = traffic_range(&query, date(2026, 7, 1)).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let query = TrafficQuery {
            start: None,
            end: None,
        };
        let err = traffic_range(&query, NaiveDate::MIN).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
