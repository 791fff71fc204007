//! Live feed behaviour seen through the dashboard service.

mod support;

use parking_lot::Mutex;
use std::sync::Arc;

use ministry_dashboard::db::repository::Collection;
use ministry_dashboard::models::ActivityReport;
use ministry_dashboard::services::DashboardService;
use serde_json::json;
use support::Fixture;

fn fixture() -> ministry_dashboard::db::LocalStore {
    Fixture::new()
        .user("u1", "Nitai", Some("Kolkata"))
        .report("r1", "u1", "2024-03-01T00:00:00Z", json!({"booksDistributed": 2}))
        .build()
}

#[tokio::test]
async fn test_feed_keeps_service_cache_fresh() {
    let store = fixture();
    let service = DashboardService::new(Arc::new(store.clone()));
    let seen = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&seen);

    let handle = service
        .change_feed()
        .watch_reports(move |_reports: Vec<ActivityReport>| *counter.lock() += 1)
        .await;
    assert!(handle.is_live());
    assert_eq!(*seen.lock(), 1);

    store.insert_json(
        Collection::Reports,
        "r2",
        json!({"createdBy": "u1", "createdAt": "2024-03-02T00:00:00Z", "booksDistributed": 5}),
    );
    assert_eq!(*seen.lock(), 2);

    // Reports come from the cache the feed filled; only users are fetched.
    let totals = service.impact_totals().await;
    assert_eq!(totals.total_books_distributed, 7);
    assert_eq!(store.fetch_count(Collection::Reports), 0);
    assert_eq!(store.fetch_count(Collection::Users), 1);

    handle.cancel();
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn test_subscription_error_is_never_surfaced() {
    let store = fixture();
    store.set_live_updates_available(false);
    store.set_ordered_queries_supported(false);
    let service = DashboardService::new(Arc::new(store.clone()));
    let delivered: Arc<Mutex<Vec<Vec<ActivityReport>>>> = Arc::default();
    let sink = Arc::clone(&delivered);

    let handle = service
        .change_feed()
        .watch_reports(move |reports| sink.lock().push(reports))
        .await;

    assert!(!handle.is_live());
    let delivered = delivered.lock();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].len(), 1);
    assert_eq!(delivered[0][0].id, "r1");
}

#[tokio::test]
async fn test_cancelled_feed_stops_refreshing_cache() {
    let store = fixture();
    let service = DashboardService::new(Arc::new(store.clone()));
    let handle = service.change_feed().watch_reports(|_| {}).await;
    handle.cancel();

    store.insert_json(Collection::Reports, "r2", json!({"createdBy": "u1"}));
    assert_eq!(service.cache().reports().map(|r| r.len()), Some(1));
}
