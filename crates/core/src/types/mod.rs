//! Core types for Stockroom.
//!
//! This module provides type-safe wrappers for the back-office domain.

pub mod cost;
pub mod email;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
