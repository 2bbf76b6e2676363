//! Server-rendered list pages.
//!
//! Pages render the current records; create and update forms post JSON to
//! the API through `static/app.js` and reload.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use stockroom_core::ExpenseCategory;

use crate::{
    db::{
        EbayTokenRepository, ExpenseRepository, InvoiceRepository, PackagingRepository, Page,
        PlanRepository, ProductRepository, PurchaseOrderRepository,
    },
    error::AppError,
    filters,
    middleware::{OptionalAuth, RequireAuth},
    models::{
        Expense, ExpenseFilter, ExpenseSummary, Invoice, Packaging, Plan, Product, PurchaseOrder,
    },
    state::AppState,
};

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate;

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub plans: Vec<Plan>,
}

/// Expenses page template.
#[derive(Template, WebTemplate)]
#[template(path = "expenses.html")]
pub struct ExpensesTemplate {
    pub email: String,
    pub current_path: &'static str,
    pub expenses: Vec<Expense>,
    pub summary: ExpenseSummary,
    pub categories: Vec<&'static str>,
}

/// Products page template.
#[derive(Template, WebTemplate)]
#[template(path = "products.html")]
pub struct ProductsTemplate {
    pub email: String,
    pub current_path: &'static str,
    pub products: Vec<Product>,
    pub search: String,
}

/// Packaging page template.
#[derive(Template, WebTemplate)]
#[template(path = "packaging.html")]
pub struct PackagingTemplate {
    pub email: String,
    pub current_path: &'static str,
    pub packaging: Vec<Packaging>,
}

/// Purchase orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "purchase_orders.html")]
pub struct PurchaseOrdersTemplate {
    pub email: String,
    pub current_path: &'static str,
    pub orders: Vec<PurchaseOrder>,
}

/// Invoice row with its overdue flag worked out.
#[derive(Debug, Clone)]
pub struct InvoiceRow {
    pub invoice: Invoice,
    pub overdue: bool,
}

/// Invoices page template.
#[derive(Template, WebTemplate)]
#[template(path = "invoices.html")]
pub struct InvoicesTemplate {
    pub email: String,
    pub current_path: &'static str,
    pub invoices: Vec<InvoiceRow>,
}

/// eBay page template.
#[derive(Template, WebTemplate)]
#[template(path = "ebay.html")]
pub struct EbayTemplate {
    pub email: String,
    pub current_path: &'static str,
    pub configured: bool,
    pub environment: Option<String>,
    pub connected_at: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Flash parameters on `/ebay` after the OAuth redirect.
#[derive(Debug, Default, Deserialize)]
pub struct EbayPageQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Search box on `/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsPageQuery {
    pub q: Option<String>,
}

/// GET /login
pub async fn login(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate.into_response()
}

/// GET /register
pub async fn register(
    OptionalAuth(user): OptionalAuth,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let plans = PlanRepository::new(state.pool()).list_all().await?;
    Ok(RegisterTemplate { plans }.into_response())
}

/// GET /expenses
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn expenses(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let repo = ExpenseRepository::new(state.pool());
    let expenses = repo.list(user.id, &ExpenseFilter::default()).await?;
    let totals = repo.totals_by_category(user.id, None, None).await?;

    Ok(ExpensesTemplate {
        email: user.email.to_string(),
        current_path: "/expenses",
        expenses,
        summary: ExpenseSummary::from_totals(None, None, totals),
        categories: ExpenseCategory::ALL.iter().map(|c| c.as_str()).collect(),
    })
}

/// GET /products
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn products(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ProductsPageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let search = query.q.unwrap_or_default();
    let products = ProductRepository::new(state.pool())
        .list(user.id, Some(search.as_str()), Page::default())
        .await?;

    Ok(ProductsTemplate {
        email: user.email.to_string(),
        current_path: "/products",
        products,
        search,
    })
}

/// GET /packaging
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn packaging(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let packaging = PackagingRepository::new(state.pool()).list(user.id).await?;

    Ok(PackagingTemplate {
        email: user.email.to_string(),
        current_path: "/packaging",
        packaging,
    })
}

/// GET /purchase-orders
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn purchase_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let orders = PurchaseOrderRepository::new(state.pool())
        .list(user.id, None, Page::default())
        .await?;

    Ok(PurchaseOrdersTemplate {
        email: user.email.to_string(),
        current_path: "/purchase-orders",
        orders,
    })
}

/// GET /invoices
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn invoices(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let invoices = InvoiceRepository::new(state.pool())
        .list(user.id, None, Page::default())
        .await?
        .into_iter()
        .map(|invoice| InvoiceRow {
            overdue: invoice.is_overdue(today),
            invoice,
        })
        .collect();

    Ok(InvoicesTemplate {
        email: user.email.to_string(),
        current_path: "/invoices",
        invoices,
    })
}

/// GET /ebay
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn ebay(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<EbayPageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let connection = EbayTokenRepository::new(state.pool()).get(user.id).await?;

    Ok(EbayTemplate {
        email: user.email.to_string(),
        current_path: "/ebay",
        configured: state.ebay().is_some(),
        environment: connection.as_ref().map(|c| c.environment.to_string()),
        connected_at: connection
            .as_ref()
            .map(|c| c.connected_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        success: query.success,
        error: query.error.map(|code| ebay_error_message(&code).to_string()),
    })
}

/// Human text for the `error` codes `/ebay/callback` redirects with.
fn ebay_error_message(code: &str) -> &'static str {
    match code {
        "not_configured" => "eBay is not configured on this server.",
        "denied" => "The authorization was declined on eBay.",
        "missing_state" | "invalid_state" | "session" => {
            "The connection attempt expired. Please try again."
        }
        "exchange_failed" => "eBay did not accept the authorization. Please try again.",
        _ => "Connecting to eBay failed.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ebay_error_message() {
        assert_eq!(
            ebay_error_message("denied"),
            "The authorization was declined on eBay."
        );
        assert_eq!(ebay_error_message("anything"), "Connecting to eBay failed.");
    }
}
