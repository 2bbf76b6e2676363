//! Stockroom Core - Shared types library.
//!
//! This crate provides the types shared by every Stockroom component:
//! - `admin` - The back-office web application (JSON API + pages)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types, arithmetic and validation - no I/O,
//! no database access, no HTTP clients. Database encoding is opt-in through
//! the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, statuses and cost-of-goods arithmetic
//! - [`validation`] - Inline input checks used by request handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::ValidationError;
