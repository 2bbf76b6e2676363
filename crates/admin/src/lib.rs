//! Stockroom back-office library.
//!
//! The server binary is a thin wrapper around [`routes::routes`]; keeping the
//! application in a library lets the integration tests drive the full router.
//!
//! # Features
//!
//! - Expenses, invoices and purchase orders
//! - Products and packaging with weighted-average cost of goods
//! - Optional eBay connection (orders, listings, traffic analytics)
//! - Token authentication with per-plan product limits

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod ebay;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
