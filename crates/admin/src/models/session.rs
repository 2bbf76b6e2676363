//! Request identity and session-stored state.

use serde::{Deserialize, Serialize};

use stockroom_core::{Email, UserId};

/// The authenticated caller, rebuilt from a verified token on each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// OAuth `state` issued by `/ebay/connect`, checked by the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EbayOAuthState {
    pub state: String,
    pub user_id: UserId,
}

/// Session keys.
pub mod session_keys {
    /// Key for the pending eBay OAuth state.
    pub const EBAY_OAUTH_STATE: &str = "ebay_oauth_state";
}
