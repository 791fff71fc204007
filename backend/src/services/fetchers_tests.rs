use serde_json::json;

use super::*;
use crate::db::repositories::LocalStore;

fn seeded_store() -> LocalStore {
    let store = LocalStore::new();
    store.insert_json(
        Collection::Reports,
        "r-old",
        json!({"createdBy": "u1", "createdAt": "2024-01-01T08:00:00Z"}),
    );
    store.insert_json(
        Collection::Reports,
        "r-new",
        json!({"createdBy": "u2", "createdAt": {"seconds": 1_720_000_000, "nanoseconds": 0}}),
    );
    store.insert_json(
        Collection::Reports,
        "r-mid",
        json!({"createdBy": "u1", "createdAt": "2024-03-01T08:00:00Z"}),
    );
    store.insert_json(Collection::Categories, "c1", json!({"categoryName": "Harinam"}));
    store.insert_json(Collection::Users, "u1", json!({"displayName": "Gopal", "temple": "Mayapur"}));
    store
}

fn ids(reports: &[ActivityReport]) -> Vec<&str> {
    reports.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn test_fetch_reports_newest_first_with_ids() {
    let store = seeded_store();
    let reports = fetch_reports(&store).await;
    assert_eq!(ids(&reports), vec!["r-new", "r-mid", "r-old"]);
    assert_eq!(reports[0].created_by.as_deref(), Some("u2"));
}

#[tokio::test]
async fn test_fetch_maps_are_keyed_by_id() {
    let store = seeded_store();
    let categories = fetch_categories(&store).await;
    let users = fetch_users(&store).await;
    assert_eq!(categories["c1"].category_name.as_deref(), Some("Harinam"));
    assert_eq!(users["u1"].temple.as_deref(), Some("Mayapur"));
}

#[tokio::test]
async fn test_unavailable_store_yields_empty_data() {
    let store = seeded_store();
    store.set_healthy(false);

    assert!(fetch_reports(&store).await.is_empty());
    assert!(fetch_categories(&store).await.is_empty());
    assert!(fetch_users(&store).await.is_empty());
    assert!(fetch_resources(&store).await.is_empty());
    assert!(try_fetch_reports(&store).await.unwrap_err().is_transient());
}

#[tokio::test]
async fn test_precondition_retry_keeps_ordering() {
    let store = seeded_store();
    store.set_ordered_queries_supported(false);

    let reports = fetch_reports(&store).await;
    assert_eq!(ids(&reports), vec!["r-new", "r-mid", "r-old"]);
    // One rejected ordered query plus one unordered retry.
    assert_eq!(store.fetch_count(Collection::Reports), 2);
}

#[tokio::test]
async fn test_user_reports_filter_and_retry() {
    let store = seeded_store();
    store.set_ordered_queries_supported(false);

    let reports = fetch_reports_for_user(&store, "u1").await;
    assert_eq!(ids(&reports), vec!["r-mid", "r-old"]);
}

#[tokio::test]
async fn test_retry_failure_falls_back_to_empty() {
    let store = seeded_store();
    store.set_ordered_queries_supported(false);
    store.set_healthy(false);

    // The first attempt is already unavailable, so no retry happens.
    assert!(fetch_reports(&store).await.is_empty());
    assert_eq!(store.fetch_count(Collection::Reports), 1);
}

#[tokio::test]
async fn test_odd_field_shapes_keep_the_report() {
    let store = seeded_store();
    store.insert_json(
        Collection::Reports,
        "float",
        json!({"createdBy": "u1", "prasadamServed": 12.0, "booksDistributed": 4}),
    );
    store.insert_json(
        Collection::Reports,
        "obj-contacts",
        json!({"createdBy": "u1", "contacts": {"a": {}}, "newContacts": 2, "booksDistributed": 5}),
    );
    store.insert_json(
        Collection::Reports,
        "odd-ids",
        json!({"createdBy": "u1", "categoryId": 7, "prasadamServed": -3, "contacts": 12}),
    );

    let reports = fetch_reports(&store).await;
    assert_eq!(reports.len(), 6);
    for id in ["float", "obj-contacts", "odd-ids"] {
        assert!(ids(&reports).contains(&id), "{} was dropped", id);
    }

    let odd = reports.iter().find(|r| r.id == "odd-ids").unwrap();
    assert_eq!(odd.category_id, None);
    assert_eq!(odd.prasadam_served, None);
    assert_eq!(odd.contacts, None);

    let users = fetch_users(&store).await;
    let totals = crate::services::aggregation::compute_impact_totals(
        &reports,
        &users,
        &crate::config::AggregationPolicy::default(),
    );
    assert_eq!(totals.total_reports, 6);
    assert_eq!(totals.total_books_distributed, 9);
    assert_eq!(totals.lives_touched, 2);
    assert_eq!(totals.total_prasadam_served, 12);
}

#[tokio::test]
async fn test_fetch_resources_newest_first() {
    let store = LocalStore::new();
    store.insert_json(
        Collection::Resources,
        "guide",
        json!({"title": "Guide", "createdAt": "2024-01-01T00:00:00Z"}),
    );
    store.insert_json(
        Collection::Resources,
        "songs",
        json!({"title": "Songs", "createdAt": "2024-06-01T00:00:00Z"}),
    );
    let resources = fetch_resources(&store).await;
    let titles: Vec<_> = resources.iter().filter_map(|r| r.title.as_deref()).collect();
    assert_eq!(titles, vec!["Songs", "Guide"]);
}

#[test]
fn test_fail_soft_passes_values_through() {
    let ok: StoreResult<Vec<u8>> = Ok(vec![1]);
    assert_eq!(fail_soft(Collection::Reports, ok), vec![1]);
    let err: StoreResult<Vec<u8>> = Err(StoreError::unavailable("down"));
    assert!(fail_soft(Collection::Reports, err).is_empty());
}
