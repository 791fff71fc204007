//! Store factory.
//!
//! Builds the store the server runs against from a [`StoreConfig`].

use log::info;
use std::sync::Arc;

use super::config::StoreConfig;
use super::repositories::LocalStore;
use super::repository::StoreResult;

/// Creates configured store instances.
///
/// # Example
/// ```ignore
/// use ministry_dashboard::db::{StoreConfig, StoreFactory};
///
/// let config = StoreConfig::from_env()?;
/// let store = StoreFactory::create(&config)?;
/// ```
pub struct StoreFactory;

impl StoreFactory {
    /// Create a store for `config`.
    ///
    /// The configuration is validated first. When `seed_file` is set the
    /// store starts with that file's contents, otherwise it starts empty.
    ///
    /// # Returns
    /// * `Ok(Arc<LocalStore>)` - Store instance
    /// * `Err(StoreError)` - Invalid configuration or unreadable seed file
    pub fn create(config: &StoreConfig) -> StoreResult<Arc<LocalStore>> {
        config.validate()?;
        let store = match &config.seed_file {
            Some(path) => {
                info!("Store: seeding from {}", path.display());
                LocalStore::from_json_file(path, config)?
            }
            None => {
                info!("Store: starting empty for project '{}'", config.project_id);
                LocalStore::with_config(config)
            }
        };
        Ok(Arc::new(store))
    }

    /// Create a store from `DASHBOARD_*` environment variables.
    pub fn from_env() -> StoreResult<Arc<LocalStore>> {
        Self::create(&StoreConfig::from_env()?)
    }
}
