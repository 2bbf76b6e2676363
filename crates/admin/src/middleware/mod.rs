//! HTTP middleware for the back office.
//!
//! # Middleware Order (outermost first, see `main.rs`)
//!
//! 1. Sentry layers (capture errors, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is an extractor rather than a layer: handlers that need a
//! user take [`RequireAuth`].

pub mod auth;
pub mod session;

pub use auth::{AUTH_COOKIE_NAME, OptionalAuth, RequireAuth, auth_cookie, clear_auth_cookie};
pub use session::create_session_layer;
