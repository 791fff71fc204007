//! Dashboard service: cache-gated loading plus the aggregation views.
//!
//! Every view goes through the cache first. A valid cache (reports fetched
//! within [`CACHE_TTL`](crate::services::cache::CACHE_TTL)) is served as-is;
//! otherwise the store is queried and successful results are written back.
//! Failed fetches degrade to empty data for that call and are not cached.

use log::debug;
use std::sync::Arc;

use crate::api::{CategorySlice, DashboardData, ImpactTotals, RecentActivityRow, RegionalSeries};
use crate::config::AggregationPolicy;
use crate::db::repository::{Collection, DocumentStore, StoreResult};
use crate::models::{ActivityReport, CategoryMap, Resource, UserMap, UserRole};
use crate::services::aggregation;
use crate::services::cache::{Cache, CachedCollection, Snapshot};
use crate::services::change_feed::ChangeFeed;
use crate::services::fetchers::{self, log_fetch_error};

/// Entry point for dashboard consumers.
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<Cache>,
    policy: AggregationPolicy,
}

impl DashboardService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_policy(store, AggregationPolicy::default())
    }

    pub fn with_policy(store: Arc<dyn DocumentStore>, policy: AggregationPolicy) -> Self {
        Self::with_cache(store, Arc::new(Cache::new()), policy)
    }

    /// Build a service around an existing cache, e.g. one shared with a feed.
    pub fn with_cache(
        store: Arc<dyn DocumentStore>,
        cache: Arc<Cache>,
        policy: AggregationPolicy,
    ) -> Self {
        Self {
            store,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Reports, newest first.
    pub async fn reports(&self) -> Arc<Vec<ActivityReport>> {
        if self.cache.is_valid() {
            if let Some(reports) = self.cache.reports() {
                debug!("DashboardService: reports served from cache");
                return reports;
            }
        }
        match fetchers::try_fetch_reports(self.store.as_ref()).await {
            Ok(reports) => {
                let reports = Arc::new(reports);
                self.cache.set(CachedCollection::Reports(Arc::clone(&reports)));
                reports
            }
            Err(e) => {
                log_fetch_error(Collection::Reports, &e);
                Arc::default()
            }
        }
    }

    pub async fn categories(&self) -> Arc<CategoryMap> {
        if self.cache.is_valid() {
            if let Some(categories) = self.cache.categories() {
                debug!("DashboardService: categories served from cache");
                return categories;
            }
        }
        match fetchers::try_fetch_categories(self.store.as_ref()).await {
            Ok(categories) => {
                let categories = Arc::new(categories);
                self.cache
                    .set(CachedCollection::Categories(Arc::clone(&categories)));
                categories
            }
            Err(e) => {
                log_fetch_error(Collection::Categories, &e);
                Arc::default()
            }
        }
    }

    pub async fn users(&self) -> Arc<UserMap> {
        if self.cache.is_valid() {
            if let Some(users) = self.cache.users() {
                debug!("DashboardService: users served from cache");
                return users;
            }
        }
        match fetchers::try_fetch_users(self.store.as_ref()).await {
            Ok(users) => {
                let users = Arc::new(users);
                self.cache.set(CachedCollection::Users(Arc::clone(&users)));
                users
            }
            Err(e) => {
                log_fetch_error(Collection::Users, &e);
                Arc::default()
            }
        }
    }

    /// A self-consistent `(reports, categories, users)` triple.
    ///
    /// On a miss all three are fetched together and the fetched values are
    /// returned directly, so one call never mixes cached and fresh data.
    pub async fn snapshot(&self) -> Snapshot {
        if self.cache.is_valid() {
            if let Some(snapshot) = self.cache.snapshot().complete() {
                debug!("DashboardService: snapshot served from cache");
                return snapshot;
            }
        }

        let store = self.store.as_ref();
        let (reports, categories, users) = tokio::join!(
            fetchers::try_fetch_reports(store),
            fetchers::try_fetch_categories(store),
            fetchers::try_fetch_users(store),
        );

        match (reports, categories, users) {
            (Ok(reports), Ok(categories), Ok(users)) => {
                let now = chrono::Utc::now();
                let snapshot = Snapshot {
                    reports: Arc::new(reports),
                    categories: Arc::new(categories),
                    users: Arc::new(users),
                    fetched_at: Some(now),
                };
                self.cache.set_all(&snapshot, now);
                snapshot
            }
            (reports, categories, users) => {
                let reports = self.keep(Collection::Reports, reports, CachedCollection::Reports);
                let categories =
                    self.keep(Collection::Categories, categories, CachedCollection::Categories);
                let users = self.keep(Collection::Users, users, CachedCollection::Users);
                Snapshot {
                    reports,
                    categories,
                    users,
                    fetched_at: self.cache.fetched_at(),
                }
            }
        }
    }

    /// Cache a successful partial result; log and substitute empty data otherwise.
    fn keep<T: Default>(
        &self,
        collection: Collection,
        result: StoreResult<T>,
        wrap: fn(Arc<T>) -> CachedCollection,
    ) -> Arc<T> {
        match result {
            Ok(value) => {
                let value = Arc::new(value);
                self.cache.set(wrap(Arc::clone(&value)));
                value
            }
            Err(e) => {
                log_fetch_error(collection, &e);
                Arc::default()
            }
        }
    }

    pub async fn impact_totals(&self) -> ImpactTotals {
        let (reports, users) = tokio::join!(self.reports(), self.users());
        aggregation::compute_impact_totals(&reports, &users, &self.policy)
    }

    /// The first `limit` reports enriched for display; `None` uses the
    /// configured default.
    pub async fn recent_activity(&self, limit: Option<usize>) -> Vec<RecentActivityRow> {
        let limit = limit.unwrap_or(self.policy.recent_activity_limit);
        let (reports, categories, users) =
            tokio::join!(self.reports(), self.categories(), self.users());
        aggregation::compute_recent_activity(&reports, &categories, &users, limit, &self.policy)
    }

    pub async fn regional_series(&self) -> RegionalSeries {
        let (reports, users) = tokio::join!(self.reports(), self.users());
        aggregation::compute_regional_series(&reports, &users, &self.policy)
    }

    pub async fn category_distribution(&self) -> Vec<CategorySlice> {
        let (reports, categories) = tokio::join!(self.reports(), self.categories());
        aggregation::compute_category_distribution(&reports, &categories)
    }

    /// All four views computed from a single snapshot.
    pub async fn dashboard(&self, recent_limit: Option<usize>) -> DashboardData {
        let snapshot = self.snapshot().await;
        let limit = recent_limit.unwrap_or(self.policy.recent_activity_limit);
        aggregation::compute_dashboard(&snapshot, limit, &self.policy)
    }

    /// Role of a directory entry, if the user exists and has one.
    pub async fn user_role(&self, user_id: &str) -> Option<UserRole> {
        self.users().await.get(user_id).and_then(|user| user.role())
    }

    /// One user's reports, newest first. Not cached.
    pub async fn reports_for_user(&self, user_id: &str) -> Vec<ActivityReport> {
        fetchers::fetch_reports_for_user(self.store.as_ref(), user_id).await
    }

    /// Shared resources, newest first. Not cached.
    pub async fn resources(&self) -> Vec<Resource> {
        fetchers::fetch_resources(self.store.as_ref()).await
    }

    /// A change feed that refreshes this service's cache.
    pub fn change_feed(&self) -> ChangeFeed {
        ChangeFeed::new(Arc::clone(&self.store), Arc::clone(&self.cache))
    }

    /// Invalidate the cache; the next view re-queries the store.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub async fn health_check(&self) -> StoreResult<bool> {
        self.store.health_check().await
    }
}
