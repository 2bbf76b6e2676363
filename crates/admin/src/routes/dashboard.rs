//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use stockroom_core::{InvoiceStatus, PurchaseOrderStatus};

use crate::{
    db::{ExpenseRepository, InvoiceRepository, ProductRepository, PurchaseOrderRepository},
    error::AppError,
    filters,
    middleware::RequireAuth,
    models::Product,
    state::AppState,
};

/// Products at or below this quantity are listed as low stock.
const LOW_STOCK_THRESHOLD: i32 = 5;

/// Low-stock rows shown on the dashboard.
const LOW_STOCK_LIMIT: i64 = 10;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardMetrics {
    pub products: i64,
    pub stock_value: Decimal,
    pub month_expenses: Decimal,
    pub open_purchase_orders: i64,
    pub unpaid_invoices: i64,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub email: String,
    pub current_path: &'static str,
    pub month_label: String,
    pub metrics: DashboardMetrics,
    pub low_stock: Vec<Product>,
    pub low_stock_threshold: i32,
}

/// First day of the month containing `day`, and of the month after.
fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day.with_day(1).unwrap_or(day);
    let end = start.checked_add_months(Months::new(1)).unwrap_or(start);
    (start, end)
}

/// Dashboard page handler.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn dashboard(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let pool = state.pool();
    let products = ProductRepository::new(pool);
    let orders = PurchaseOrderRepository::new(pool);
    let invoices = InvoiceRepository::new(pool);
    let expenses = ExpenseRepository::new(pool);

    let today = Utc::now().date_naive();
    let (month_start, next_month) = month_bounds(today);

    let (count, stock_value, low_stock, month_expenses, draft, ordered, sent) = tokio::try_join!(
        products.count_active(user.id),
        products.stock_value(user.id),
        products.low_stock(user.id, LOW_STOCK_THRESHOLD, LOW_STOCK_LIMIT),
        expenses.total_between(user.id, month_start, next_month),
        orders.count_by_status(user.id, PurchaseOrderStatus::Draft),
        orders.count_by_status(user.id, PurchaseOrderStatus::Ordered),
        invoices.count_by_status(user.id, InvoiceStatus::Sent),
    )?;

    Ok(DashboardTemplate {
        email: user.email.to_string(),
        current_path: "/",
        month_label: month_start.format("%B %Y").to_string(),
        metrics: DashboardMetrics {
            products: count,
            stock_value,
            month_expenses,
            open_purchase_orders: draft + ordered,
            unpaid_invoices: sent,
        },
        low_stock,
        low_stock_threshold: LOW_STOCK_THRESHOLD,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let day = NaiveDate::from_ymd_opt(2026, 12, 17).unwrap();
        let (start, end) = month_bounds(day);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }
}
