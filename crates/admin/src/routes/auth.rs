//! Account registration and token issue.
//!
//! Both register and login answer with the token in the body (for API
//! clients) and in the `sr_token` cookie (for the pages).

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{PlanRepository, UserRepository};
use crate::error::AppError;
use crate::middleware::{RequireAuth, auth_cookie, clear_auth_cookie};
use crate::models::{Plan, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Body of `POST /api/auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued token and the account it belongs to.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

/// Response of `GET /api/auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub plan: Plan,
}

/// Create an account on the default plan and log it in.
///
/// POST /api/auth/register
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.name, &body.password)
        .await?;

    tracing::info!(user_id = %user.id, "Account registered");
    token_response(&state, user, StatusCode::CREATED)
}

/// Exchange email and password for a token.
///
/// POST /api/auth/login
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    token_response(&state, user, StatusCode::OK)
}

/// Clear the token cookie.
///
/// Tokens are stateless, so a bearer token stays valid until it expires.
///
/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_auth_cookie(state.config().uses_https());
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cookie.to_string())],
    )
}

/// The caller's account and plan.
///
/// GET /api/auth/me
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let plan = PlanRepository::new(state.pool())
        .get_by_id(user.plan_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {} has no plan", user.id)))?;

    Ok(Json(MeResponse { user, plan }))
}

fn token_response(
    state: &AppState,
    user: User,
    status: StatusCode,
) -> Result<impl IntoResponse + use<>, AppError> {
    let jwt = state.jwt();
    let token = jwt.issue(user.id, &user.email)?;
    let cookie = auth_cookie(token.clone(), jwt.ttl_secs(), state.config().uses_https());

    Ok((
        status,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(TokenResponse {
            token,
            expires_in: jwt.ttl_secs(),
            user,
        }),
    ))
}
