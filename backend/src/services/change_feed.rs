//! Change feed adapter.
//!
//! Wraps the store's live subscriptions. Each push is sorted and decoded the
//! same way the matching fetcher does it, written to the cache (reports only),
//! then handed to the single registered callback.
//!
//! A failed subscription never reaches the caller: the adapter performs one
//! regular fetch instead and delivers that result, or an empty sequence if the
//! fetch fails as well.

use log::{info, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::db::repository::{Collection, Document, DocumentStore, PushCallback, Query, Subscription};
use crate::models::{ActivityReport, Resource};
use crate::services::cache::{Cache, CachedCollection};
use crate::services::fetchers::{
    decode_documents, log_fetch_error, query_with_fallback, reports_query, resources_query,
};

/// Observer for one feed.
pub type FeedCallback<T> = Arc<dyn Fn(Vec<T>) + Send + Sync>;

/// Handle returned by the `watch_*` calls.
///
/// The feed stays attached for as long as the handle lives; dropping it
/// detaches from the store just like [`FeedHandle::cancel`].
#[derive(Debug)]
#[must_use = "dropping a FeedHandle cancels the feed"]
pub struct FeedHandle {
    collection: Collection,
    subscription: Option<Subscription>,
}

impl FeedHandle {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// False when the feed fell back to a one-shot fetch.
    pub fn is_live(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(Subscription::is_attached)
    }

    /// Detach from the store. No callbacks are delivered afterwards.
    pub fn cancel(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            info!("ChangeFeed: {} feed cancelled", self.collection);
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Live-update adapter bound to a store and the cache it refreshes.
#[derive(Clone)]
pub struct ChangeFeed {
    store: Arc<dyn DocumentStore>,
    cache: Arc<Cache>,
}

impl ChangeFeed {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<Cache>) -> Self {
        Self { store, cache }
    }

    /// Follow the reports collection, newest first. Every delivery also
    /// replaces the cached reports.
    pub async fn watch_reports<F>(&self, on_change: F) -> FeedHandle
    where
        F: Fn(Vec<ActivityReport>) + Send + Sync + 'static,
    {
        let cache = Arc::clone(&self.cache);
        self.watch(
            Collection::Reports,
            reports_query(),
            move |reports: &[ActivityReport]| {
                cache.set(CachedCollection::Reports(Arc::new(reports.to_vec())));
            },
            Arc::new(on_change),
        )
        .await
    }

    /// Follow the resources collection, newest first. Resources are not cached.
    pub async fn watch_resources<F>(&self, on_change: F) -> FeedHandle
    where
        F: Fn(Vec<Resource>) + Send + Sync + 'static,
    {
        self.watch(
            Collection::Resources,
            resources_query(),
            |_: &[Resource]| {},
            Arc::new(on_change),
        )
        .await
    }

    async fn watch<T, S>(
        &self,
        collection: Collection,
        query: Query,
        store_in_cache: S,
        on_change: FeedCallback<T>,
    ) -> FeedHandle
    where
        T: DeserializeOwned + 'static,
        S: Fn(&[T]) + Send + Sync + 'static,
    {
        let store_in_cache = Arc::new(store_in_cache);
        let deliver = {
            let on_change = Arc::clone(&on_change);
            let store_in_cache = Arc::clone(&store_in_cache);
            move |documents: Vec<Document>| {
                let records: Vec<T> = decode_documents(collection, documents);
                store_in_cache(&records);
                on_change(records);
            }
        };

        let order = query.order_by.clone();
        let push_deliver = deliver.clone();
        let on_push: PushCallback = Arc::new(move |mut documents: Vec<Document>| {
            if let Some(order) = &order {
                order.sort(&mut documents);
            }
            push_deliver(documents);
        });

        match self.store.subscribe(collection, &query, on_push).await {
            Ok(subscription) => {
                info!("ChangeFeed: listening for {} changes", collection);
                FeedHandle {
                    collection,
                    subscription: Some(subscription),
                }
            }
            Err(e) => {
                warn!(
                    "ChangeFeed: live updates for {} failed, fetching once instead: {}",
                    collection, e
                );
                match query_with_fallback(self.store.as_ref(), collection, &query).await {
                    Ok(documents) => deliver(documents),
                    Err(e) => {
                        log_fetch_error(collection, &e);
                        on_change(Vec::new());
                    }
                }
                FeedHandle {
                    collection,
                    subscription: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalStore;
    use parking_lot::Mutex;
    use serde_json::json;

    fn store_with_reports() -> LocalStore {
        let store = LocalStore::new();
        store.insert_json(
            Collection::Reports,
            "r-old",
            json!({"createdAt": "2024-01-01T00:00:00Z"}),
        );
        store.insert_json(
            Collection::Reports,
            "r-new",
            json!({"createdAt": "2024-06-01T00:00:00Z"}),
        );
        store
    }

    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<Vec<T>>>>, impl Fn(Vec<T>) + Send + Sync) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |items: Vec<T>| sink.lock().push(items))
    }

    fn ids(reports: &[ActivityReport]) -> Vec<String> {
        reports.iter().map(|r| r.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_live_reports_feed_updates_cache_and_callback() {
        let store = store_with_reports();
        let cache = Arc::new(Cache::new());
        let feed = ChangeFeed::new(Arc::new(store.clone()), Arc::clone(&cache));
        let (calls, on_change) = recorder::<ActivityReport>();

        let handle = feed.watch_reports(on_change).await;
        assert!(handle.is_live());
        assert_eq!(calls.lock().len(), 1);
        assert_eq!(ids(&calls.lock()[0]), vec!["r-new", "r-old"]);
        assert!(cache.is_valid());

        store.insert_json(
            Collection::Reports,
            "r-newest",
            json!({"createdAt": "2024-09-01T00:00:00Z"}),
        );
        assert_eq!(calls.lock().len(), 2);
        assert_eq!(ids(&calls.lock()[1]), vec!["r-newest", "r-new", "r-old"]);
        assert_eq!(cache.reports().map(|r| r.len()), Some(3));

        handle.cancel();
        assert_eq!(store.subscriber_count(), 0);
        store.insert_json(Collection::Reports, "r-late", json!({}));
        assert_eq!(calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_dropped_handle_detaches_feed() {
        let store = store_with_reports();
        let cache = Arc::new(Cache::new());
        let feed = ChangeFeed::new(Arc::new(store.clone()), Arc::clone(&cache));
        let (calls, on_change) = recorder::<ActivityReport>();

        {
            let handle = feed.watch_reports(on_change).await;
            assert!(handle.is_live());
            assert_eq!(store.subscriber_count(), 1);
        }

        assert_eq!(store.subscriber_count(), 0);
        store.insert_json(Collection::Reports, "r-late", json!({}));
        assert_eq!(calls.lock().len(), 1);
        assert_eq!(cache.reports().map(|r| r.len()), Some(2));
    }

    #[tokio::test]
    async fn test_subscription_failure_fetches_once() {
        let store = store_with_reports();
        store.set_live_updates_available(false);
        let cache = Arc::new(Cache::new());
        let feed = ChangeFeed::new(Arc::new(store.clone()), Arc::clone(&cache));
        let (calls, on_change) = recorder::<ActivityReport>();

        let handle = feed.watch_reports(on_change).await;
        assert!(!handle.is_live());
        assert_eq!(store.fetch_count(Collection::Reports), 1);
        assert_eq!(calls.lock().len(), 1);
        assert_eq!(ids(&calls.lock()[0]), vec!["r-new", "r-old"]);
        assert!(cache.is_valid());
    }

    #[tokio::test]
    async fn test_double_failure_delivers_empty_and_leaves_cache() {
        let store = store_with_reports();
        store.set_healthy(false);
        let cache = Arc::new(Cache::new());
        let feed = ChangeFeed::new(Arc::new(store.clone()), Arc::clone(&cache));
        let (calls, on_change) = recorder::<ActivityReport>();

        let handle = feed.watch_reports(on_change).await;
        assert!(!handle.is_live());
        assert_eq!(calls.lock().len(), 1);
        assert!(calls.lock()[0].is_empty());
        assert!(!cache.is_valid());
        assert!(cache.snapshot().is_empty());
        handle.cancel();
    }

    #[tokio::test]
    async fn test_resources_feed_skips_cache() {
        let store = LocalStore::new();
        store.insert_json(
            Collection::Resources,
            "res1",
            json!({"title": "Guide", "createdAt": "2024-01-01T00:00:00Z"}),
        );
        let cache = Arc::new(Cache::new());
        let feed = ChangeFeed::new(Arc::new(store.clone()), Arc::clone(&cache));
        let (calls, on_change) = recorder::<Resource>();

        let handle = feed.watch_resources(on_change).await;
        assert_eq!(handle.collection(), Collection::Resources);
        assert_eq!(calls.lock()[0].len(), 1);
        assert!(cache.snapshot().is_empty());
        handle.cancel();
    }
}
