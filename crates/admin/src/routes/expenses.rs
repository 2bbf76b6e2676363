//! Expense API handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use stockroom_core::ExpenseId;
use stockroom_core::validation::require_date_order;

use crate::db::ExpenseRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{Expense, ExpenseFilter, ExpenseRequest, ExpenseSummary};
use crate::state::AppState;

/// Build the expenses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list).post(create))
        .route("/expenses/summary", get(summary))
        .route("/expenses/{id}", get(show).put(update).delete(delete))
}

/// Query string of `GET /api/expenses/summary`.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/expenses
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, AppError> {
    filter.validate()?;
    let expenses = ExpenseRepository::new(state.pool())
        .list(user.id, &filter)
        .await?;
    Ok(Json(expenses))
}

/// POST /api/expenses
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let input = body.validate()?;
    let expense = ExpenseRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /api/expenses/{id}
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ExpenseId>,
) -> Result<Json<Expense>, AppError> {
    ExpenseRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Expense".to_string()))
}

/// PUT /api/expenses/{id}
#[instrument(skip(user, state, body), fields(user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ExpenseId>,
    Json(body): Json<ExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    let input = body.validate()?;
    let expense = ExpenseRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;
    Ok(Json(expense))
}

/// DELETE /api/expenses/{id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ExpenseId>,
) -> Result<StatusCode, AppError> {
    if ExpenseRepository::new(state.pool())
        .soft_delete(user.id, id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Expense".to_string()))
    }
}

/// Totals per category and overall for an optional date range.
///
/// GET /api/expenses/summary
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn summary(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ExpenseSummary>, AppError> {
    if let Some(from) = query.from {
        require_date_order("to", from, query.to)?;
    }

    let totals = ExpenseRepository::new(state.pool())
        .totals_by_category(user.id, query.from, query.to)
        .await?;
    Ok(Json(ExpenseSummary::from_totals(query.from, query.to, totals)))
}
