//! Collection fetchers.
//!
//! Each collection has a `try_fetch_*` function returning `StoreResult` and a
//! `fetch_*` wrapper that never fails: store errors are logged once here and
//! turned into empty data, so the dashboard renders zeros instead of failing
//! when the store is briefly unavailable.
//!
//! Ordered queries that the store rejects with a failed precondition (a missing
//! index) are retried once without ordering and sorted client-side.

use log::{info, warn};
use serde::de::DeserializeOwned;

use crate::db::repository::{
    Collection, Document, DocumentStore, Query, StoreError, StoreResult,
};
use crate::models::{ActivityReport, CategoryMap, PreachingCategory, Resource, User, UserMap};

/// Field reports and resources are ordered by.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field holding a report's author id.
pub const CREATED_BY_FIELD: &str = "createdBy";

/// Reports newest first.
pub fn reports_query() -> Query {
    Query::all().order_by_desc(CREATED_AT_FIELD)
}

/// One user's reports, newest first.
pub fn user_reports_query(user_id: &str) -> Query {
    Query::all()
        .where_eq(CREATED_BY_FIELD, user_id)
        .order_by_desc(CREATED_AT_FIELD)
}

/// Resources newest first.
pub fn resources_query() -> Query {
    Query::all().order_by_desc(CREATED_AT_FIELD)
}

/// Run a query, degrading to an unordered query plus a client-side sort when
/// the store cannot serve the ordered one.
pub async fn query_with_fallback(
    store: &dyn DocumentStore,
    collection: Collection,
    query: &Query,
) -> StoreResult<Vec<Document>> {
    match store.fetch_collection(collection, query).await {
        Err(e) if e.is_failed_precondition() && query.order_by.is_some() => {
            info!(
                "Fetchers: ordered query on {} unavailable ({}), retrying unordered",
                collection, e
            );
            let mut documents = store
                .fetch_collection(collection, &query.without_ordering())
                .await?;
            if let Some(order) = &query.order_by {
                order.sort(&mut documents);
            }
            Ok(documents)
        }
        other => other,
    }
}

/// Decode documents into records, skipping (and logging) any that do not fit
/// the record shape.
pub fn decode_documents<T: DeserializeOwned>(
    collection: Collection,
    documents: Vec<Document>,
) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|doc| match doc.into_record::<T>(collection) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Fetchers: skipping undecodable document: {}", e);
                None
            }
        })
        .collect()
}

/// Convert a fetch result into data, logging and substituting the empty value
/// on error.
pub fn fail_soft<T: Default>(collection: Collection, result: StoreResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log_fetch_error(collection, &e);
            T::default()
        }
    }
}

pub(crate) fn log_fetch_error(collection: Collection, error: &StoreError) {
    if error.is_transient() {
        warn!(
            "Fetchers: {} unavailable, using empty data: {}",
            collection, error
        );
    } else {
        warn!(
            "Fetchers: failed to fetch {}, using empty data: {}",
            collection, error
        );
    }
}

pub async fn try_fetch_reports(store: &dyn DocumentStore) -> StoreResult<Vec<ActivityReport>> {
    let documents = query_with_fallback(store, Collection::Reports, &reports_query()).await?;
    Ok(decode_documents(Collection::Reports, documents))
}

pub async fn try_fetch_reports_for_user(
    store: &dyn DocumentStore,
    user_id: &str,
) -> StoreResult<Vec<ActivityReport>> {
    let query = user_reports_query(user_id);
    let documents = query_with_fallback(store, Collection::Reports, &query).await?;
    Ok(decode_documents(Collection::Reports, documents))
}

pub async fn try_fetch_categories(store: &dyn DocumentStore) -> StoreResult<CategoryMap> {
    let documents = store
        .fetch_collection(Collection::Categories, &Query::all())
        .await?;
    Ok(decode_documents::<PreachingCategory>(Collection::Categories, documents)
        .into_iter()
        .map(|category| (category.id.clone(), category))
        .collect())
}

pub async fn try_fetch_users(store: &dyn DocumentStore) -> StoreResult<UserMap> {
    let documents = store
        .fetch_collection(Collection::Users, &Query::all())
        .await?;
    Ok(decode_documents::<User>(Collection::Users, documents)
        .into_iter()
        .map(|user| (user.id.clone(), user))
        .collect())
}

pub async fn try_fetch_resources(store: &dyn DocumentStore) -> StoreResult<Vec<Resource>> {
    let documents = query_with_fallback(store, Collection::Resources, &resources_query()).await?;
    Ok(decode_documents(Collection::Resources, documents))
}

/// All reports, newest first; empty on error.
pub async fn fetch_reports(store: &dyn DocumentStore) -> Vec<ActivityReport> {
    fail_soft(Collection::Reports, try_fetch_reports(store).await)
}

/// One user's reports, newest first; empty on error.
pub async fn fetch_reports_for_user(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Vec<ActivityReport> {
    fail_soft(
        Collection::Reports,
        try_fetch_reports_for_user(store, user_id).await,
    )
}

/// Categories by id; empty on error.
pub async fn fetch_categories(store: &dyn DocumentStore) -> CategoryMap {
    fail_soft(Collection::Categories, try_fetch_categories(store).await)
}

/// Users by id; empty on error.
pub async fn fetch_users(store: &dyn DocumentStore) -> UserMap {
    fail_soft(Collection::Users, try_fetch_users(store).await)
}

/// Resources, newest first; empty on error.
pub async fn fetch_resources(store: &dyn DocumentStore) -> Vec<Resource> {
    fail_soft(Collection::Resources, try_fetch_resources(store).await)
}

#[cfg(test)]
#[path = "fetchers_tests.rs"]
mod fetchers_tests;
