//! Store connection descriptor and environment variable handling.
//!
//! Only the store collaborator reads this; the aggregation code never sees it.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use super::repository::StoreError;

fn default_images_bucket() -> String {
    "report-images".to_string()
}

fn default_resources_bucket() -> String {
    "resources".to_string()
}

/// Connection descriptor for the remote document and blob stores.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub api_key: String,
    /// Bucket receiving report images
    #[serde(default = "default_images_bucket")]
    pub images_bucket: String,
    /// Bucket receiving resource files
    #[serde(default = "default_resources_bucket")]
    pub resources_bucket: String,
    /// JSON file used to seed the in-memory store
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            images_bucket: default_images_bucket(),
            resources_bucket: default_resources_bucket(),
            seed_file: None,
        }
    }
}

impl StoreConfig {
    /// Create a store configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DASHBOARD_PROJECT_ID` (required): store project identifier
    /// - `DASHBOARD_API_KEY` (required): store API key
    /// - `DASHBOARD_IMAGES_BUCKET` (optional, default: `report-images`)
    /// - `DASHBOARD_RESOURCES_BUCKET` (optional, default: `resources`)
    /// - `DASHBOARD_SEED_FILE` (optional): JSON seed for the in-memory store
    ///
    /// # Errors
    /// Returns a configuration error if required variables are not set.
    pub fn from_env() -> Result<Self, StoreError> {
        let project_id = env::var("DASHBOARD_PROJECT_ID").map_err(|_| {
            StoreError::configuration("DASHBOARD_PROJECT_ID environment variable not set")
        })?;
        let api_key = env::var("DASHBOARD_API_KEY").map_err(|_| {
            StoreError::configuration("DASHBOARD_API_KEY environment variable not set")
        })?;
        let images_bucket =
            env::var("DASHBOARD_IMAGES_BUCKET").unwrap_or_else(|_| default_images_bucket());
        let resources_bucket =
            env::var("DASHBOARD_RESOURCES_BUCKET").unwrap_or_else(|_| default_resources_bucket());
        let seed_file = env::var("DASHBOARD_SEED_FILE").ok().map(PathBuf::from);

        let config = Self {
            project_id,
            api_key,
            images_bucket,
            resources_bucket,
            seed_file,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the descriptor is usable.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.project_id.trim().is_empty() {
            return Err(StoreError::configuration("store project_id must not be empty"));
        }
        if self.images_bucket.trim().is_empty() || self.resources_bucket.trim().is_empty() {
            return Err(StoreError::configuration("bucket names must not be empty"));
        }
        Ok(())
    }
}

// Hand-written so the API key never reaches the logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .field("images_bucket", &self.images_bucket)
            .field("resources_bucket", &self.resources_bucket)
            .field("seed_file", &self.seed_file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = StoreConfig {
            project_id: "ministry".into(),
            api_key: "secret-key".into(),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("ministry"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_validate_requires_project() {
        assert!(StoreConfig::default().validate().is_err());
        let config = StoreConfig {
            project_id: "p".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
