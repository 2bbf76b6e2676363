//! Purchase order API handlers.
//!
//! Moving an order to `received` replenishes every linked product and
//! packaging record at its landed unit cost in the same transaction.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use stockroom_core::{PurchaseOrderId, PurchaseOrderStatus};

use crate::db::{Page, PurchaseOrderRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{
    BulkExpenseResult, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderRequest,
    PurchaseOrderStatusRequest, ReceiveOutcome,
};
use crate::services::create_expenses_for_purchase_order;
use crate::state::AppState;

/// Build the purchase orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/purchase-orders", get(list).post(create))
        .route(
            "/purchase-orders/{id}",
            get(show).put(update).delete(delete),
        )
        .route("/purchase-orders/{id}/status", post(set_status))
        .route("/purchase-orders/{id}/expenses", post(create_expenses))
}

/// Query string of `GET /api/purchase-orders`.
#[derive(Debug, Deserialize)]
pub struct PurchaseOrderListQuery {
    pub status: Option<PurchaseOrderStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/purchase-orders
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<PurchaseOrderListQuery>,
) -> Result<Json<Vec<PurchaseOrder>>, AppError> {
    let orders = PurchaseOrderRepository::new(state.pool())
        .list(user.id, query.status, Page::new(query.limit, query.offset))
        .await?;
    Ok(Json(orders))
}

/// POST /api/purchase-orders
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<PurchaseOrderRequest>,
) -> Result<(StatusCode, Json<PurchaseOrderDetail>), AppError> {
    let input = body.validate()?;
    let detail = PurchaseOrderRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/purchase-orders/{id}
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PurchaseOrderId>,
) -> Result<Json<PurchaseOrderDetail>, AppError> {
    PurchaseOrderRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))
}

/// Replace a draft order's header and items.
///
/// PUT /api/purchase-orders/{id}
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PurchaseOrderId>,
    Json(body): Json<PurchaseOrderRequest>,
) -> Result<Json<PurchaseOrderDetail>, AppError> {
    let input = body.validate()?;
    let detail = PurchaseOrderRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;
    Ok(Json(detail))
}

/// DELETE /api/purchase-orders/{id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PurchaseOrderId>,
) -> Result<StatusCode, AppError> {
    if PurchaseOrderRepository::new(state.pool())
        .soft_delete(user.id, id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Purchase order".to_string()))
    }
}

/// Change an order's status; `received` also books the stock.
///
/// POST /api/purchase-orders/{id}/status
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn set_status(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PurchaseOrderId>,
    Json(body): Json<PurchaseOrderStatusRequest>,
) -> Result<Json<ReceiveOutcome>, AppError> {
    let outcome = PurchaseOrderRepository::new(state.pool())
        .set_status(user.id, id, body.status)
        .await?;
    Ok(Json(outcome))
}

/// Book one expense per line, plus shipping.
///
/// Lines that fail are reported in `failed`; the rest are still created.
///
/// POST /api/purchase-orders/{id}/expenses
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn create_expenses(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<PurchaseOrderId>,
) -> Result<(StatusCode, Json<BulkExpenseResult>), AppError> {
    let result = create_expenses_for_purchase_order(state.pool(), user.id, id).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
