//! Object storage for uploaded images and resource files.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::StoreResult;

/// Where an uploaded object lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobLocator {
    pub bucket: String,
    pub path: String,
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}

/// Blob storage collaborator. It enforces no size or type limits; callers
/// validate before delegating.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> StoreResult<BlobLocator>;

    async fn public_url(&self, locator: &BlobLocator) -> StoreResult<String>;

    async fn delete(&self, locator: &BlobLocator) -> StoreResult<()>;
}
