//! Packaging API handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use stockroom_core::PackagingId;

use crate::db::{PackagingRepository, ReplenishmentRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{
    Packaging, PackagingReplenishment, PackagingRequest, ReplenishRequest, Replenishment,
};
use crate::state::AppState;

/// Build the packaging router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/packaging", get(list).post(create))
        .route("/packaging/{id}", get(show).put(update).delete(delete))
        .route("/packaging/{id}/replenish", post(replenish))
        .route("/packaging/{id}/replenishments", get(replenishments))
}

/// GET /api/packaging
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Packaging>>, AppError> {
    let packaging = PackagingRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(packaging))
}

/// POST /api/packaging
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<PackagingRequest>,
) -> Result<(StatusCode, Json<Packaging>), AppError> {
    let input = body.validate()?;
    let packaging = PackagingRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(packaging)))
}

/// GET /api/packaging/{id}
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PackagingId>,
) -> Result<Json<Packaging>, AppError> {
    PackagingRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Packaging".to_string()))
}

/// PUT /api/packaging/{id}
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PackagingId>,
    Json(body): Json<PackagingRequest>,
) -> Result<Json<Packaging>, AppError> {
    let input = body.validate()?;
    let packaging = PackagingRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;
    Ok(Json(packaging))
}

/// Delete packaging no live product uses.
///
/// DELETE /api/packaging/{id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PackagingId>,
) -> Result<StatusCode, AppError> {
    if PackagingRepository::new(state.pool())
        .soft_delete(user.id, id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Packaging".to_string()))
    }
}

/// POST /api/packaging/{id}/replenish
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn replenish(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PackagingId>,
    Json(body): Json<ReplenishRequest>,
) -> Result<(StatusCode, Json<PackagingReplenishment>), AppError> {
    let input = body.validate()?;
    let outcome = ReplenishmentRepository::new(state.pool())
        .replenish_packaging(user.id, id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/packaging/{id}/replenishments
pub async fn replenishments(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PackagingId>,
) -> Result<Json<Vec<Replenishment>>, AppError> {
    if PackagingRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Packaging".to_string()));
    }

    let history = ReplenishmentRepository::new(state.pool())
        .list_for_packaging(user.id, id)
        .await?;
    Ok(Json(history))
}
