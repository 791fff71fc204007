//! Data Transfer Objects for the HTTP API.
//!
//! Dashboard views are served as-is from [`crate::api`]; only the
//! request/response shapes specific to the HTTP surface live here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::api::{
    CategorySlice, DashboardData, ImpactTotals, RecentActivityRow, RegionalSeries,
};

/// Largest `limit` accepted by the recent activity endpoints.
pub const MAX_RECENT_LIMIT: usize = 100;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Store reachability: "connected", "disconnected" or an error message
    pub store: String,
}

/// Query parameters for the recent activity table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentQuery {
    /// Rows to return; the configured default when omitted
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Cache state after a clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusResponse {
    pub valid: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Role lookup result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleResponse {
    pub user_id: String,
    pub role: String,
    pub is_admin: bool,
}
