//! Dashboard configuration file support.
//!
//! Reads `dashboard.toml`:
//!
//! ```toml
//! [store]
//! project_id = "ministry-reports"
//! api_key = "..."
//! images_bucket = "report-images"
//! resources_bucket = "resources"
//! seed_file = "seed.json"
//!
//! [aggregation]
//! prasadam_per_contact = 1.5
//! prasadam_per_life_touched = 2
//! recent_activity_limit = 10
//! region_limit = 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::config::StoreConfig;
use crate::db::repository::StoreError;

/// Estimation and display knobs used by the aggregation code.
///
/// The defaults reproduce the dashboard's established numbers; changing them
/// changes what the charts show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationPolicy {
    /// Meals assumed per contact when a report has no prasadam count.
    pub prasadam_per_contact: f64,
    /// Meals assumed per life touched when no report anywhere carries a
    /// prasadam figure.
    pub prasadam_per_life_touched: u64,
    /// Rows shown in the recent activity table when the caller gives no limit.
    pub recent_activity_limit: usize,
    /// Regions emitted in the regional series.
    pub region_limit: usize,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            prasadam_per_contact: 1.5,
            prasadam_per_life_touched: 2,
            recent_activity_limit: 10,
            region_limit: 5,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub aggregation: AggregationPolicy,
}

impl DashboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(DashboardConfig)` if successful
    /// * `Err(StoreError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            StoreError::configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        toml::from_str(content)
            .map_err(|e| StoreError::configuration(format!("Failed to parse config file: {}", e)))
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `dashboard.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, StoreError> {
        let search_paths = [
            PathBuf::from("dashboard.toml"),
            PathBuf::from("backend/dashboard.toml"),
            PathBuf::from("../dashboard.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(StoreError::configuration(
            "No dashboard.toml found in standard locations",
        ))
    }
}
