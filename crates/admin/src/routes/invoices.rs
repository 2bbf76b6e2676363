//! Invoice API handlers.
//!
//! Only drafts may be edited; status changes follow
//! [`InvoiceStatus::can_transition_to`].

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use stockroom_core::{InvoiceId, InvoiceStatus};

use crate::db::{InvoiceRepository, Page, RepositoryError};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Invoice, InvoiceRequest, InvoiceStatusRequest};
use crate::state::AppState;

/// Build the invoices router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list).post(create))
        .route("/invoices/{id}", get(show).put(update).delete(delete))
        .route("/invoices/{id}/status", post(set_status))
}

/// Query string of `GET /api/invoices`.
#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    pub status: Option<InvoiceStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/invoices
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let invoices = InvoiceRepository::new(state.pool())
        .list(user.id, query.status, Page::new(query.limit, query.offset))
        .await?;
    Ok(Json(invoices))
}

/// POST /api/invoices
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<InvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let input = body.validate()?;
    let invoice = InvoiceRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /api/invoices/{id}
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, AppError> {
    load(&state, &user, id).await.map(Json)
}

/// PUT /api/invoices/{id}
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Json(body): Json<InvoiceRequest>,
) -> Result<Json<Invoice>, AppError> {
    let input = body.validate()?;
    let current = load(&state, &user, id).await?;
    if !current.status.is_editable() {
        return Err(AppError::Conflict(format!(
            "a {} invoice can no longer be edited",
            current.status
        )));
    }

    let invoice = InvoiceRepository::new(state.pool())
        .update_draft(user.id, id, &input)
        .await
        .map_err(|e| match e {
            // lost a race with a status change
            RepositoryError::NotFound => {
                AppError::Conflict("invoice is no longer a draft".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(invoice))
}

/// DELETE /api/invoices/{id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> Result<StatusCode, AppError> {
    if InvoiceRepository::new(state.pool())
        .soft_delete(user.id, id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Invoice".to_string()))
    }
}

/// Move an invoice along its lifecycle. Marking it paid stamps `paid_at`.
///
/// POST /api/invoices/{id}/status
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn set_status(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Json(body): Json<InvoiceStatusRequest>,
) -> Result<Json<Invoice>, AppError> {
    let current = load(&state, &user, id).await?;
    if !current.status.can_transition_to(body.status) {
        return Err(AppError::Conflict(format!(
            "cannot move a {} invoice to {}",
            current.status, body.status
        )));
    }

    let invoice = InvoiceRepository::new(state.pool())
        .transition(user.id, id, current.status, body.status)
        .await?;

    tracing::info!(invoice_id = %id, status = %invoice.status, "Invoice status changed");
    Ok(Json(invoice))
}

async fn load(
    state: &AppState,
    user: &CurrentUser,
    id: InvoiceId,
) -> Result<Invoice, AppError> {
    InvoiceRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
}
