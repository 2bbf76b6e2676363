//! Product API handlers.
//!
//! Creating a product counts against the plan's product limit. Stock and
//! cost of goods are opening values on create; after that they change only
//! through replenishment.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use stockroom_core::{ProductId, UserId};

use crate::db::{Page, PlanRepository, ProductRepository, ReplenishmentRepository, UserRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{Product, ProductReplenishment, ProductRequest, ReplenishRequest, Replenishment};
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/{id}", get(show).put(update).delete(delete))
        .route("/products/{id}/replenish", post(replenish))
        .route("/products/{id}/replenishments", get(replenishments))
}

/// Query string of `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    /// Matches SKU or name.
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/products
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = ProductRepository::new(state.pool())
        .list(
            user.id,
            query.q.as_deref(),
            Page::new(query.limit, query.offset),
        )
        .await?;
    Ok(Json(products))
}

/// POST /api/products
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let input = body.validate()?;
    ensure_product_allowance(&state, user.id).await?;

    let product = ProductRepository::new(state.pool())
        .create(user.id, &input)
        .await?;

    tracing::info!(product_id = %product.id, sku = %product.sku, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products/{id}
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, AppError> {
    ProductRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// PUT /api/products/{id}
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    let input = body.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/{id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, AppError> {
    if ProductRepository::new(state.pool())
        .soft_delete(user.id, id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Product".to_string()))
    }
}

/// Receive stock and recompute the weighted-average COG.
///
/// POST /api/products/{id}/replenish
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn replenish(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ReplenishRequest>,
) -> Result<(StatusCode, Json<ProductReplenishment>), AppError> {
    let input = body.validate()?;
    let outcome = ReplenishmentRepository::new(state.pool())
        .replenish_product(user.id, id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/products/{id}/replenishments
pub async fn replenishments(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Replenishment>>, AppError> {
    if ProductRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Product".to_string()));
    }

    let history = ReplenishmentRepository::new(state.pool())
        .list_for_product(user.id, id)
        .await?;
    Ok(Json(history))
}

/// Refuse a new product once the plan's limit is reached.
async fn ensure_product_allowance(state: &AppState, user_id: UserId) -> Result<(), AppError> {
    let account = UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
    let plan = PlanRepository::new(state.pool())
        .get_by_id(account.plan_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {user_id} has no plan")))?;
    let current = ProductRepository::new(state.pool())
        .count_active(user_id)
        .await?;

    if plan.allows_another_product(current) {
        Ok(())
    } else {
        tracing::info!(plan = %plan.code, current, "Product limit reached");
        Err(AppError::Forbidden(format!(
            "the {} plan allows up to {} products; upgrade to add more",
            plan.name,
            plan.max_products.unwrap_or_default()
        )))
    }
}
