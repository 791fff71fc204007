//! Cache layer for the reference collections.
//!
//! Holds the last-fetched reports, categories and users plus the time of the
//! last reports fetch. Only storing reports moves that clock: categories and
//! users ride along on the reports' freshness, so a cache whose reports are
//! fresh is valid even if the other two were stored earlier.

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::db::repository::Collection;
use crate::models::{ActivityReport, CategoryMap, UserMap};

/// How long a reports fetch keeps the cache valid.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Data for one cached collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedCollection {
    Reports(Arc<Vec<ActivityReport>>),
    Categories(Arc<CategoryMap>),
    Users(Arc<UserMap>),
}

impl CachedCollection {
    pub fn collection(&self) -> Collection {
        match self {
            CachedCollection::Reports(_) => Collection::Reports,
            CachedCollection::Categories(_) => Collection::Categories,
            CachedCollection::Users(_) => Collection::Users,
        }
    }
}

/// Raw cache contents; any slot may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    pub reports: Option<Arc<Vec<ActivityReport>>>,
    pub categories: Option<Arc<CategoryMap>>,
    pub users: Option<Arc<UserMap>>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.reports.is_none()
            && self.categories.is_none()
            && self.users.is_none()
            && self.fetched_at.is_none()
    }

    /// The full triple, if every slot is populated.
    pub fn complete(&self) -> Option<Snapshot> {
        Some(Snapshot {
            reports: Arc::clone(self.reports.as_ref()?),
            categories: Arc::clone(self.categories.as_ref()?),
            users: Arc::clone(self.users.as_ref()?),
            fetched_at: self.fetched_at,
        })
    }
}

/// A self-consistent triple handed to the aggregation code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub reports: Arc<Vec<ActivityReport>>,
    pub categories: Arc<CategoryMap>,
    pub users: Arc<UserMap>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Shared cache; the only writer of the snapshot.
#[derive(Debug, Default)]
pub struct Cache {
    snapshot: RwLock<CacheSnapshot>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff reports were fetched less than [`CACHE_TTL`] ago.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.snapshot.read().fetched_at {
            Some(fetched_at) => {
                let age = now.signed_duration_since(fetched_at);
                age.num_milliseconds() < CACHE_TTL.as_millis() as i64
            }
            None => false,
        }
    }

    /// Cached data for a collection. Resources are never cached.
    pub fn get(&self, collection: Collection) -> Option<CachedCollection> {
        let snapshot = self.snapshot.read();
        match collection {
            Collection::Reports => snapshot.reports.clone().map(CachedCollection::Reports),
            Collection::Categories => snapshot
                .categories
                .clone()
                .map(CachedCollection::Categories),
            Collection::Users => snapshot.users.clone().map(CachedCollection::Users),
            Collection::Resources => None,
        }
    }

    pub fn reports(&self) -> Option<Arc<Vec<ActivityReport>>> {
        self.snapshot.read().reports.clone()
    }

    pub fn categories(&self) -> Option<Arc<CategoryMap>> {
        self.snapshot.read().categories.clone()
    }

    pub fn users(&self) -> Option<Arc<UserMap>> {
        self.snapshot.read().users.clone()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().fetched_at
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.snapshot.read().clone()
    }

    /// Replace one collection. Storing reports stamps the fetch time.
    pub fn set(&self, data: CachedCollection) {
        self.set_at(data, Utc::now());
    }

    pub fn set_at(&self, data: CachedCollection, now: DateTime<Utc>) {
        let mut snapshot = self.snapshot.write();
        debug!("Cache: storing {}", data.collection());
        match data {
            CachedCollection::Reports(reports) => {
                snapshot.reports = Some(reports);
                snapshot.fetched_at = Some(now);
            }
            CachedCollection::Categories(categories) => snapshot.categories = Some(categories),
            CachedCollection::Users(users) => snapshot.users = Some(users),
        }
    }

    /// Replace all three collections under one lock acquisition.
    pub fn set_all(&self, snapshot: &Snapshot, now: DateTime<Utc>) {
        *self.snapshot.write() = CacheSnapshot {
            reports: Some(Arc::clone(&snapshot.reports)),
            categories: Some(Arc::clone(&snapshot.categories)),
            users: Some(Arc::clone(&snapshot.users)),
            fetched_at: Some(now),
        };
    }

    /// Drop everything, including the fetch time.
    pub fn clear(&self) {
        *self.snapshot.write() = CacheSnapshot::default();
        debug!("Cache: cleared");
    }
}
