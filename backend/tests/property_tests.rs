//! Property tests for the aggregation engine.

use proptest::prelude::*;

use ministry_dashboard::config::AggregationPolicy;
use ministry_dashboard::models::{
    ActivityReport, BookCount, BookSizes, CategoryMap, Contact, PreachingCategory, User, UserMap,
};
use ministry_dashboard::services::{
    compute_category_distribution, compute_impact_totals, compute_regional_series,
};

const TEMPLES: [&str; 7] = ["Mayapur", "Vrindavan", "London", "Kolkata", "Sydney", "Lima", "Accra"];

fn directory() -> UserMap {
    TEMPLES
        .iter()
        .enumerate()
        .map(|(i, temple)| {
            let id = format!("u{}", i);
            let user = User {
                id: id.clone(),
                display_name: Some(format!("Preacher {}", i)),
                temple: Some(temple.to_string()),
                ..Default::default()
            };
            (id, user)
        })
        .collect()
}

fn arb_books() -> impl Strategy<Value = Option<BookCount>> {
    prop_oneof![
        Just(None),
        (0u64..500).prop_map(|n| Some(BookCount::Count(n))),
        (0u64..50, 0u64..50, 0u64..50)
            .prop_map(|(big, medium, small)| Some(BookSizes { big, medium, small }.into())),
    ]
}

fn arb_contact() -> impl Strategy<Value = Contact> {
    (any::<bool>(), any::<bool>()).prop_map(|(flag, typed)| Contact {
        is_new: flag.then_some(true),
        contact_type: typed.then(|| "returning".to_string()),
        ..Default::default()
    })
}

fn arb_report() -> impl Strategy<Value = ActivityReport> {
    (
        0usize..9,
        arb_books(),
        proptest::option::of(proptest::collection::vec(arb_contact(), 0..6)),
        proptest::option::of(0u64..40),
        proptest::option::of(0u64..100),
        proptest::option::of(prop_oneof![Just("c1"), Just("c2"), Just("zz")]),
    )
        .prop_map(|(author, books, contacts, new_contacts, prasadam, category)| ActivityReport {
            created_by: Some(format!("u{}", author)),
            books_distributed: books,
            contacts,
            new_contacts,
            prasadam_served: prasadam,
            category_id: category.map(str::to_string),
            ..ActivityReport::new(format!("r{}", author))
        })
}

fn arb_reports_and_shuffle() -> impl Strategy<Value = (Vec<ActivityReport>, Vec<ActivityReport>)> {
    proptest::collection::vec(arb_report(), 0..30)
        .prop_flat_map(|reports| (Just(reports.clone()), Just(reports).prop_shuffle()))
}

proptest! {
    #[test]
    fn impact_totals_ignore_report_order((reports, shuffled) in arb_reports_and_shuffle()) {
        let users = directory();
        let policy = AggregationPolicy::default();
        prop_assert_eq!(
            compute_impact_totals(&reports, &users, &policy),
            compute_impact_totals(&shuffled, &users, &policy)
        );
    }

    #[test]
    fn regional_series_keeps_first_encountered_regions(reports in proptest::collection::vec(arb_report(), 0..40)) {
        let users = directory();
        let policy = AggregationPolicy::default();
        let series = compute_regional_series(&reports, &users, &policy);

        let mut expected: Vec<String> = Vec::new();
        for report in &reports {
            let label = report
                .created_by
                .as_deref()
                .and_then(|id| users.get(id))
                .and_then(|u| u.temple.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            if !expected.contains(&label) {
                expected.push(label);
            }
        }
        expected.truncate(policy.region_limit);

        prop_assert_eq!(&series.labels, &expected);
        prop_assert_eq!(series.books.len(), series.labels.len());
        prop_assert_eq!(series.prasadam.len(), series.labels.len());
        prop_assert_eq!(series.events.len(), series.labels.len());
        prop_assert!(series.events.iter().sum::<u64>() <= reports.len() as u64);
    }

    #[test]
    fn category_distribution_is_sorted_and_complete(reports in proptest::collection::vec(arb_report(), 0..30)) {
        let mut categories = CategoryMap::new();
        categories.insert("c1".into(), PreachingCategory::named("c1", "Harinam"));
        categories.insert("c2".into(), PreachingCategory::named("c2", "Book Table"));

        let slices = compute_category_distribution(&reports, &categories);
        prop_assert!(slices.windows(2).all(|w| w[0].value >= w[1].value));
        if reports.is_empty() {
            prop_assert_eq!(slices.len(), 2);
            prop_assert!(slices.iter().all(|s| s.value == 0));
        } else {
            prop_assert_eq!(slices.iter().map(|s| s.value).sum::<u64>(), reports.len() as u64);
        }
    }
}

#[test]
fn regional_series_caps_seven_temples_at_five() {
    let users = directory();
    let mut reports: Vec<ActivityReport> = (0..7)
        .map(|i| ActivityReport {
            created_by: Some(format!("u{}", i)),
            ..ActivityReport::new(format!("r{}", i))
        })
        .collect();
    // The last temple has by far the most volume.
    reports.extend((0..20).map(|i| ActivityReport {
        created_by: Some("u6".into()),
        books_distributed: Some(BookCount::Count(1000)),
        ..ActivityReport::new(format!("bulk{}", i))
    }));

    let series = compute_regional_series(&reports, &users, &AggregationPolicy::default());
    assert_eq!(series.labels, vec!["Mayapur", "Vrindavan", "London", "Kolkata", "Sydney"]);
}
