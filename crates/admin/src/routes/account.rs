//! Plans and plan changes.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::db::{PlanRepository, ProductRepository, UserRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{Plan, User};
use crate::state::AppState;

/// Body of `PUT /api/account/plan`.
#[derive(Debug, Deserialize)]
pub struct ChangePlanRequest {
    pub plan_code: String,
}

/// Every plan, cheapest first. Public so the register page can show them.
///
/// GET /api/plans
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<Plan>>, AppError> {
    let plans = PlanRepository::new(state.pool()).list_all().await?;
    Ok(Json(plans))
}

/// Move the caller to another plan.
///
/// A downgrade is refused while the account holds more products than the
/// new plan allows.
///
/// PUT /api/account/plan
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn change_plan(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ChangePlanRequest>,
) -> Result<Json<User>, AppError> {
    let code = body.plan_code.trim().to_ascii_lowercase();
    let plan = PlanRepository::new(state.pool())
        .get_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("Plan".to_string()))?;

    let products = ProductRepository::new(state.pool())
        .count_active(user.id)
        .await?;
    if !plan.fits_product_count(products) {
        return Err(AppError::Conflict(format!(
            "the {} plan allows {} products but the account has {products}",
            plan.name,
            plan.max_products.unwrap_or_default()
        )));
    }

    let updated = UserRepository::new(state.pool())
        .set_plan(user.id, plan.id)
        .await?;

    tracing::info!(plan = %plan.code, "Plan changed");
    Ok(Json(updated))
}
