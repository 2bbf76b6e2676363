//! Business logic services for the back office.
//!
//! # Services
//!
//! - `auth` - Password accounts and JWT issuance
//! - `ebay` - eBay OAuth connection and token freshness
//! - `purchasing` - Expenses booked from purchase orders

pub mod auth;
pub mod ebay;
pub mod purchasing;

pub use auth::{AuthError, AuthService, Claims, JwtKeys};
pub use ebay::EbayService;
pub use purchasing::create_expenses_for_purchase_order;
