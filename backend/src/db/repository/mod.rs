//! Trait definitions for the external store collaborators.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for store operations
//! - [`query`]: Collections, documents, filters and ordering
//! - [`store`]: The document store contract (fetch, subscribe, add)
//! - [`blob`]: The object storage contract used by uploads
//!
//! # Convenience Trait Bound
//!
//! Code that needs both documents and blobs (e.g. publishing a resource) can
//! take a [`FullStore`]:
//!
//! ```ignore
//! async fn publish<S: FullStore>(store: &S, draft: ResourceDraft, file: UploadFile) -> StoreResult<Resource> {
//!     let uploaded = uploads::upload_resource_file(store, file).await?;
//!     ...
//! }
//! ```

pub mod blob;
pub mod error;
pub mod query;
pub mod store;

pub use blob::{BlobLocator, BlobStore};
pub use error::{ErrorContext, StoreError, StoreResult};
pub use query::{Collection, Document, FieldFilter, OrderBy, Query, SortDirection};
pub use store::{DocumentStore, PushCallback, Subscription};

/// Composite trait bound for a store offering both documents and blobs.
pub trait FullStore: DocumentStore + BlobStore {}

// Blanket implementation: anything implementing both traits is a FullStore
impl<T> FullStore for T where T: DocumentStore + BlobStore {}
