//! In-memory local store implementation.
//!
//! This module provides a local implementation of the store traits suitable
//! for unit testing, local development and the demo server. Documents, blobs
//! and live listeners are kept in memory, with switches to simulate the
//! failure modes of the remote store.

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::config::StoreConfig;
use crate::db::repository::*;

/// In-memory document and blob store.
///
/// # Example
/// ```
/// use ministry_dashboard::db::repositories::LocalStore;
/// use ministry_dashboard::db::repository::Collection;
///
/// let store = LocalStore::new();
/// store.insert_json(Collection::Categories, "c1", serde_json::json!({"categoryName": "Harinam"}));
/// assert_eq!(store.document_count(Collection::Categories), 1);
/// ```
#[derive(Clone)]
pub struct LocalStore {
    data: Arc<RwLock<LocalData>>,
}

struct Listener {
    collection: Collection,
    query: Query,
    callback: PushCallback,
}

struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

struct LocalData {
    collections: HashMap<Collection, Vec<Document>>,
    blobs: HashMap<BlobLocator, StoredBlob>,
    listeners: HashMap<Uuid, Listener>,
    fetch_counts: HashMap<Collection, usize>,
    images_bucket: String,
    resources_bucket: String,

    // Fault injection
    is_healthy: bool,
    live_updates_available: bool,
    ordered_queries_supported: bool,
}

impl LocalData {
    fn from_config(config: &StoreConfig) -> Self {
        Self {
            collections: HashMap::new(),
            blobs: HashMap::new(),
            listeners: HashMap::new(),
            fetch_counts: HashMap::new(),
            images_bucket: config.images_bucket.clone(),
            resources_bucket: config.resources_bucket.clone(),
            is_healthy: true,
            live_updates_available: true,
            ordered_queries_supported: true,
        }
    }

    fn ensure_healthy(&self, context: ErrorContext) -> StoreResult<()> {
        if self.is_healthy {
            Ok(())
        } else {
            Err(StoreError::unavailable_with_context(
                "Local store is marked unhealthy",
                context,
            ))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LocalSeed {
    #[serde(default)]
    reports: Vec<Value>,
    #[serde(default)]
    categories: Vec<Value>,
    #[serde(default)]
    users: Vec<Value>,
    #[serde(default)]
    resources: Vec<Value>,
}

impl LocalStore {
    /// Create a new empty local store with default bucket names.
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    /// Create an empty store using the bucket names from `config`.
    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::from_config(config))),
        }
    }

    /// Load a store from a JSON seed file shaped as
    /// `{"reports": [...], "categories": [...], "users": [...], "resources": [...]}`.
    ///
    /// Each entry's `id` field becomes the document id; entries without one
    /// get a generated id.
    pub fn from_json_file<P: AsRef<Path>>(path: P, config: &StoreConfig) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StoreError::configuration(format!(
                "Failed to read seed file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&content, config)
    }

    /// Load a store from seed JSON text.
    pub fn from_json_str(content: &str, config: &StoreConfig) -> StoreResult<Self> {
        let seed: LocalSeed = serde_json::from_str(content)
            .map_err(|e| StoreError::configuration(format!("Failed to parse seed JSON: {}", e)))?;

        let store = Self::with_config(config);
        {
            let mut data = store.data.write();
            for (collection, entries) in [
                (Collection::Reports, seed.reports),
                (Collection::Categories, seed.categories),
                (Collection::Users, seed.users),
                (Collection::Resources, seed.resources),
            ] {
                let documents = entries.into_iter().map(seed_document).collect();
                data.collections.insert(collection, documents);
            }
        }
        Ok(store)
    }

    /// Insert or replace a document, then push to live listeners.
    pub fn insert_document(&self, collection: Collection, document: Document) {
        {
            let mut data = self.data.write();
            let documents = data.collections.entry(collection).or_default();
            match documents.iter_mut().find(|d| d.id == document.id) {
                Some(existing) => *existing = document,
                None => documents.push(document),
            }
        }
        self.notify(collection);
    }

    /// Insert or replace a document given as a JSON object.
    pub fn insert_json(&self, collection: Collection, id: impl Into<String>, value: Value) {
        self.insert_document(collection, Document::from_value(id, value));
    }

    /// Remove a document, pushing to listeners if it existed.
    pub fn remove_document(&self, collection: Collection, id: &str) -> bool {
        let removed = {
            let mut data = self.data.write();
            let documents = data.collections.entry(collection).or_default();
            let before = documents.len();
            documents.retain(|d| d.id != id);
            documents.len() != before
        };
        if removed {
            self.notify(collection);
        }
        removed
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make `subscribe` fail while one-shot fetches keep working.
    pub fn set_live_updates_available(&self, available: bool) {
        self.data.write().live_updates_available = available;
    }

    /// Simulate a store without the index needed for ordered queries.
    pub fn set_ordered_queries_supported(&self, supported: bool) {
        self.data.write().ordered_queries_supported = supported;
    }

    /// Number of `fetch_collection` calls made against a collection,
    /// including failed ones.
    pub fn fetch_count(&self, collection: Collection) -> usize {
        self.data
            .read()
            .fetch_counts
            .get(&collection)
            .copied()
            .unwrap_or(0)
    }

    pub fn document_count(&self, collection: Collection) -> usize {
        self.data
            .read()
            .collections
            .get(&collection)
            .map_or(0, Vec::len)
    }

    /// Number of attached live listeners.
    pub fn subscriber_count(&self) -> usize {
        self.data.read().listeners.len()
    }

    pub fn blob_count(&self) -> usize {
        self.data.read().blobs.len()
    }

    /// Content type recorded for a stored blob.
    pub fn blob_content_type(&self, locator: &BlobLocator) -> Option<String> {
        self.data
            .read()
            .blobs
            .get(locator)
            .map(|b| b.content_type.clone())
    }

    /// Size in bytes of a stored blob.
    pub fn blob_size(&self, locator: &BlobLocator) -> Option<usize> {
        self.data.read().blobs.get(locator).map(|b| b.bytes.len())
    }

    fn notify(&self, collection: Collection) {
        // Collect under the lock, invoke outside it: callbacks may call back in.
        let pushes: Vec<(PushCallback, Vec<Document>)> = {
            let data = self.data.read();
            let documents = data
                .collections
                .get(&collection)
                .cloned()
                .unwrap_or_default();
            data.listeners
                .values()
                .filter(|l| l.collection == collection)
                .map(|l| (Arc::clone(&l.callback), l.query.apply(documents.clone())))
                .collect()
        };
        for (callback, documents) in pushes {
            callback(documents);
        }
    }
}

fn seed_document(value: Value) -> Document {
    let mut fields = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => id,
        _ => Uuid::new_v4().simple().to_string(),
    };
    Document::new(id, fields)
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn fetch_collection(
        &self,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Vec<Document>> {
        let mut data = self.data.write();
        *data.fetch_counts.entry(collection).or_insert(0) += 1;

        let context = ErrorContext::new("fetch_collection").with_collection(collection);
        data.ensure_healthy(context.clone())?;

        if query.order_by.is_some() && !data.ordered_queries_supported {
            return Err(StoreError::failed_precondition_with_context(
                "The query requires an index that is not configured",
                context,
            ));
        }

        let documents = data
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default();
        Ok(query.apply(documents))
    }

    async fn subscribe(
        &self,
        collection: Collection,
        query: &Query,
        on_push: PushCallback,
    ) -> StoreResult<Subscription> {
        let listener_id = Uuid::new_v4();
        let initial = {
            let mut data = self.data.write();
            let context = ErrorContext::new("subscribe").with_collection(collection);
            data.ensure_healthy(context.clone())?;
            if !data.live_updates_available {
                return Err(StoreError::unavailable_with_context(
                    "Live updates are not available",
                    context,
                ));
            }
            data.listeners.insert(
                listener_id,
                Listener {
                    collection,
                    query: query.clone(),
                    callback: Arc::clone(&on_push),
                },
            );
            let documents = data
                .collections
                .get(&collection)
                .cloned()
                .unwrap_or_default();
            query.apply(documents)
        };
        debug!(
            "Local store: listener {} attached to {}",
            listener_id, collection
        );

        // The first push carries the current contents.
        on_push(initial);

        let data = Arc::clone(&self.data);
        Ok(Subscription::new(move || {
            data.write().listeners.remove(&listener_id);
        }))
    }

    async fn add_document(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> StoreResult<String> {
        self.data
            .read()
            .ensure_healthy(ErrorContext::new("add_document").with_collection(collection))?;
        let id = Uuid::new_v4().simple().to_string();
        self.insert_document(collection, Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<BlobLocator> {
        let mut data = self.data.write();
        data.ensure_healthy(ErrorContext::new("put_blob").with_document_id(path))?;
        let bucket = if path.starts_with("resources/") {
            data.resources_bucket.clone()
        } else {
            data.images_bucket.clone()
        };
        let locator = BlobLocator {
            bucket,
            path: path.to_string(),
        };
        data.blobs.insert(
            locator.clone(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(locator)
    }

    async fn public_url(&self, locator: &BlobLocator) -> StoreResult<String> {
        let data = self.data.read();
        match data.blobs.get(locator) {
            Some(_) => Ok(format!(
                "https://storage.local/{}/{}",
                locator.bucket, locator.path
            )),
            None => Err(StoreError::not_found_with_context(
                "Blob does not exist",
                ErrorContext::new("public_url").with_document_id(locator),
            )),
        }
    }

    async fn delete(&self, locator: &BlobLocator) -> StoreResult<()> {
        let mut data = self.data.write();
        data.ensure_healthy(ErrorContext::new("delete_blob").with_document_id(locator))?;
        match data.blobs.remove(locator) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found_with_context(
                "Blob does not exist",
                ErrorContext::new("delete_blob").with_document_id(locator),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_counts_and_health() {
        let store = LocalStore::new();
        store.insert_json(Collection::Users, "u1", json!({"displayName": "Gopal"}));

        let docs = store
            .fetch_collection(Collection::Users, &Query::all())
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);

        store.set_healthy(false);
        let err = store
            .fetch_collection(Collection::Users, &Query::all())
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.fetch_count(Collection::Users), 2);
        assert!(!store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_ordered_query_precondition() {
        let store = LocalStore::new();
        store.set_ordered_queries_supported(false);
        let ordered = Query::all().order_by_desc("createdAt");
        let err = store
            .fetch_collection(Collection::Reports, &ordered)
            .await
            .unwrap_err();
        assert!(err.is_failed_precondition());
        assert!(store
            .fetch_collection(Collection::Reports, &ordered.without_ordering())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_subscription_pushes_until_unsubscribed() {
        let store = LocalStore::new();
        let pushes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pushes);
        let subscription = store
            .subscribe(
                Collection::Reports,
                &Query::all(),
                Arc::new(move |docs: Vec<Document>| sink.lock().push(docs.len())),
            )
            .await
            .unwrap();

        store.insert_json(Collection::Reports, "r1", json!({}));
        store.insert_json(Collection::Categories, "c1", json!({}));
        assert_eq!(*pushes.lock(), vec![0, 1]);
        assert_eq!(store.subscriber_count(), 1);

        subscription.unsubscribe();
        store.insert_json(Collection::Reports, "r2", json!({}));
        assert_eq!(*pushes.lock(), vec![0, 1]);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_fails_when_live_updates_unavailable() {
        let store = LocalStore::new();
        store.set_live_updates_available(false);
        let result = store
            .subscribe(Collection::Reports, &Query::all(), Arc::new(|_| {}))
            .await;
        assert!(result.is_err());
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_blob_lifecycle_routes_buckets() {
        let store = LocalStore::new();
        let image = store
            .put("reports/u1/1_photo.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        let file = store
            .put("resources/1_guide.pdf", vec![4], "application/pdf")
            .await
            .unwrap();
        assert_eq!(image.bucket, "report-images");
        assert_eq!(file.bucket, "resources");
        assert_eq!(
            store.public_url(&image).await.unwrap(),
            "https://storage.local/report-images/reports/u1/1_photo.png"
        );

        store.delete(&image).await.unwrap();
        assert!(store.delete(&image).await.is_err());
        assert!(store.public_url(&image).await.is_err());
        assert_eq!(store.blob_count(), 1);
    }

    #[test]
    fn test_seed_from_json() {
        let seed = r#"{
            "reports": [{"id": "r1", "createdBy": "u1"}, {"createdBy": "u2"}],
            "users": [{"id": "u1", "temple": "Mayapur"}]
        }"#;
        let store = LocalStore::from_json_str(seed, &StoreConfig::default()).unwrap();
        assert_eq!(store.document_count(Collection::Reports), 2);
        assert_eq!(store.document_count(Collection::Users), 1);
        assert_eq!(store.document_count(Collection::Categories), 0);
        assert!(LocalStore::from_json_str("not json", &StoreConfig::default()).is_err());
    }
}
