//! Store access for the dashboard.
//!
//! The remote document and blob stores are consumed through narrow traits so
//! the rest of the crate never depends on a particular backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API, change feed consumers)    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (crate::services)                        │
//! │  - Fail-soft fetchers and cache                         │
//! │  - Aggregation and uploads                              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Store Traits (repository/) - DocumentStore, BlobStore  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │               Local Store                     │
//!     │        (in-memory, optionally seeded)         │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//! ```ignore
//! use ministry_dashboard::db::{StoreConfig, StoreFactory};
//! use ministry_dashboard::services::DashboardService;
//!
//! let store = StoreFactory::create(&StoreConfig::from_env()?)?;
//! let service = DashboardService::new(store);
//! let totals = service.impact_totals().await;
//! ```

pub mod config;
pub mod factory;
pub mod repositories;
pub mod repository;

pub use config::StoreConfig;
pub use factory::StoreFactory;
pub use repositories::LocalStore;
pub use repository::{
    BlobLocator, BlobStore, Collection, Document, DocumentStore, ErrorContext, FullStore, Query,
    StoreError, StoreResult, Subscription,
};
