//! Document store trait: the read/write/subscribe contract of the remote store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::error::StoreResult;
use super::query::{Collection, Document, Query};

/// Callback invoked with the full, query-shaped result set on every push.
pub type PushCallback = Arc<dyn Fn(Vec<Document>) + Send + Sync>;

/// Handle to a live subscription. Call [`Subscription::unsubscribe`] to detach.
///
/// Dropping the handle without unsubscribing leaves the subscription attached,
/// matching how the remote store treats its listener handles.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle with nothing attached.
    pub fn detached() -> Self {
        Self { detach: None }
    }

    pub fn is_attached(&self) -> bool {
        self.detach.is_some()
    }

    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Remote document store, consumed through this narrow contract.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the documents of a collection matching `query`.
    ///
    /// # Errors
    /// * `StoreError::Unavailable` when the store cannot be reached
    /// * `StoreError::FailedPrecondition` when the query shape needs an index
    ///   the store does not have
    async fn fetch_collection(
        &self,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Vec<Document>>;

    /// Attach a live listener. `on_push` receives the whole matching result set
    /// each time the collection changes, starting with the current contents.
    async fn subscribe(
        &self,
        collection: Collection,
        query: &Query,
        on_push: PushCallback,
    ) -> StoreResult<Subscription>;

    /// Insert a new document and return its store-assigned id.
    async fn add_document(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> StoreResult<String>;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> StoreResult<bool>;
}
