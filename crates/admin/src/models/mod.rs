//! Domain models for the back office.
//!
//! Each resource has a stored record type (serialized straight to JSON), a
//! `*Request` type deserialized from the API, and a validated `*Input`
//! produced by `Request::validate` that the repositories accept.

pub mod expense;
pub mod inventory;
pub mod invoice;
pub mod purchase_order;
pub mod session;
pub mod user;

pub use expense::{
    CategoryTotal, Expense, ExpenseFilter, ExpenseInput, ExpenseRequest, ExpenseSummary,
};
pub use inventory::{
    Packaging, PackagingInput, PackagingReplenishment, PackagingRequest, Product, ProductInput,
    ProductReplenishment, ProductRequest, ReplenishInput, ReplenishRequest, Replenishment,
};
pub use invoice::{Invoice, InvoiceInput, InvoiceRequest, InvoiceStatusRequest};
pub use purchase_order::{
    BulkExpenseFailure, BulkExpenseResult, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderInput,
    PurchaseOrderItem, PurchaseOrderItemInput, PurchaseOrderItemRequest, PurchaseOrderRequest,
    PurchaseOrderStatusRequest, ReceiveOutcome,
};
pub use session::{CurrentUser, EbayOAuthState, session_keys};
pub use user::{Plan, User};
