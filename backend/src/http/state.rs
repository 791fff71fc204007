//! Application state for the HTTP server.

use std::sync::Arc;

use crate::services::DashboardService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Dashboard service; owns the store handle and the cache
    pub service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(service: DashboardService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
