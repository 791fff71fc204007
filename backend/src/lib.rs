//! # Ministry Dashboard Backend
//!
//! Aggregation core for the preaching ministry reporting dashboard.
//!
//! Field activity reports, preaching categories and the user/temple directory
//! are read from a document store, cached for a few minutes and turned into
//! the dashboard's four views: impact totals, recent activity rows, the
//! regional series and the category distribution.
//!
//! ## Architecture
//!
//! - [`models`]: Store records (reports, categories, users, resources) and
//!   their polymorphic field shapes
//! - [`db`]: Store traits, errors, configuration and the in-memory store
//! - [`services`]: Fetchers, cache, normalizers, aggregation, change feed and
//!   upload helpers
//! - [`api`]: Serializable view types returned to consumers
//! - [`config`]: `dashboard.toml` loading and the aggregation policy
//! - [`http`]: Axum-based HTTP server (feature `http-server`)
//!
//! ## Failure model
//!
//! Store outages never reach the views: fetchers log and substitute empty
//! data, so the dashboard renders zeros. Only upload validation errors are
//! returned to callers.

// StoreError carries an ErrorContext for debugging.
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
