//! Aggregation engine.
//!
//! Four pure projections over `(reports, categories, users)`. They never
//! mutate their inputs and give the same output for the same snapshot.

use std::collections::{BTreeSet, HashMap};

use crate::api::{CategorySlice, DashboardData, ImpactTotals, RecentActivityRow, RegionalSeries};
use crate::config::AggregationPolicy;
use crate::models::{ActivityReport, CategoryMap, PreachingCategory, User, UserMap};
use crate::services::cache::Snapshot;
use crate::services::normalize::{
    book_count, category_name, display_date, display_name, new_contact_count, prasadam_count,
    region_key, OTHER_CATEGORY, UNKNOWN_ACTIVITY,
};

fn author<'a>(report: &ActivityReport, users: &'a UserMap) -> Option<&'a User> {
    report.created_by.as_deref().and_then(|id| users.get(id))
}

fn category<'a>(report: &ActivityReport, categories: &'a CategoryMap) -> Option<&'a PreachingCategory> {
    report.category_id.as_deref().and_then(|id| categories.get(id))
}

/// Counts come straight from the store, so totals clamp at `u64::MAX`.
fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// Compute the headline impact numbers.
///
/// When no report yields any prasadam figure (reported or estimated), the
/// total falls back to `lives_touched * policy.prasadam_per_life_touched`.
pub fn compute_impact_totals(
    reports: &[ActivityReport],
    users: &UserMap,
    policy: &AggregationPolicy,
) -> ImpactTotals {
    let total_books_distributed =
        saturating_total(reports.iter().map(|r| book_count(r.books_distributed.as_ref())));
    let lives_touched = saturating_total(reports.iter().map(new_contact_count));

    let prasadam_sum = saturating_total(reports.iter().map(|r| prasadam_count(r, policy)));
    let total_prasadam_served = if prasadam_sum == 0 {
        lives_touched.saturating_mul(policy.prasadam_per_life_touched)
    } else {
        prasadam_sum
    };

    // Authors missing from the directory still count above, but not here.
    let temples: BTreeSet<&str> = reports
        .iter()
        .filter_map(|r| author(r, users))
        .filter_map(|u| u.temple.as_deref())
        .filter(|t| !t.is_empty())
        .collect();

    ImpactTotals {
        total_reports: reports.len(),
        total_books_distributed,
        lives_touched,
        total_prasadam_served,
        active_preachers: users.len(),
        cities_covered: temples.len(),
    }
}

/// Enrich the first `limit` reports, in the order given, for the activity table.
pub fn compute_recent_activity(
    reports: &[ActivityReport],
    categories: &CategoryMap,
    users: &UserMap,
    limit: usize,
    policy: &AggregationPolicy,
) -> Vec<RecentActivityRow> {
    reports
        .iter()
        .take(limit)
        .map(|report| {
            let author = author(report, users);
            RecentActivityRow {
                id: report.id.clone(),
                date: display_date(report),
                activity: category_name(
                    category(report, categories),
                    Some(report),
                    UNKNOWN_ACTIVITY,
                ),
                preacher: display_name(author),
                temple: region_key(author),
                books_distributed: book_count(report.books_distributed.as_ref()),
                prasadam_served: prasadam_count(report, policy),
                new_contacts: new_contact_count(report),
            }
        })
        .collect()
}

#[derive(Default)]
struct RegionTotals {
    books: u64,
    prasadam: u64,
    events: u64,
}

/// Group reports by the author's temple.
///
/// Only the first `policy.region_limit` regions *encountered* are emitted, in
/// encounter order. This is not a top-N by volume.
pub fn compute_regional_series(
    reports: &[ActivityReport],
    users: &UserMap,
    policy: &AggregationPolicy,
) -> RegionalSeries {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, RegionTotals> = HashMap::new();

    for report in reports {
        let key = region_key(author(report, users));
        let entry = totals.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            RegionTotals::default()
        });
        entry.books = entry
            .books
            .saturating_add(book_count(report.books_distributed.as_ref()));
        entry.prasadam = entry.prasadam.saturating_add(prasadam_count(report, policy));
        entry.events = entry.events.saturating_add(1);
    }

    let mut series = RegionalSeries::default();
    for label in order.into_iter().take(policy.region_limit) {
        if let Some(t) = totals.get(&label) {
            series.books.push(t.books);
            series.prasadam.push(t.prasadam);
            series.events.push(t.events);
            series.labels.push(label);
        }
    }
    series
}

/// Report counts per category name, largest first.
///
/// Every known category is seeded at zero, zero entries are then dropped. If
/// nothing is left, all known categories are returned at zero so the chart is
/// not blank.
pub fn compute_category_distribution(
    reports: &[ActivityReport],
    categories: &CategoryMap,
) -> Vec<CategorySlice> {
    let mut slices: Vec<CategorySlice> = Vec::new();
    for known in categories.values() {
        let name = category_name(Some(known), None, OTHER_CATEGORY);
        if !slices.iter().any(|s| s.name == name) {
            slices.push(CategorySlice::new(name, 0));
        }
    }
    let seeded = slices.clone();

    for report in reports {
        let name = category_name(category(report, categories), Some(report), OTHER_CATEGORY);
        match slices.iter_mut().find(|s| s.name == name) {
            Some(slice) => slice.value += 1,
            None => slices.push(CategorySlice::new(name, 1)),
        }
    }

    slices.retain(|s| s.value > 0);
    // Stable: ties keep seeding/encounter order.
    slices.sort_by(|a, b| b.value.cmp(&a.value));

    if slices.is_empty() {
        seeded
    } else {
        slices
    }
}

/// All four views from one snapshot.
pub fn compute_dashboard(
    snapshot: &Snapshot,
    recent_limit: usize,
    policy: &AggregationPolicy,
) -> DashboardData {
    DashboardData {
        impact: compute_impact_totals(&snapshot.reports, &snapshot.users, policy),
        recent_activity: compute_recent_activity(
            &snapshot.reports,
            &snapshot.categories,
            &snapshot.users,
            recent_limit,
            policy,
        ),
        regions: compute_regional_series(&snapshot.reports, &snapshot.users, policy),
        categories: compute_category_distribution(&snapshot.reports, &snapshot.categories),
    }
}

#[cfg(test)]
#[path = "aggregation_tests.rs"]
mod aggregation_tests;
