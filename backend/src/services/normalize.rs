//! Field normalizers.
//!
//! Pure functions that resolve the optional and polymorphic shapes a report
//! field may take into one canonical value. Empty strings count as absent in
//! every name-resolution chain.

use crate::config::AggregationPolicy;
use crate::models::{ActivityReport, BookCount, PreachingCategory, StoreTimestamp, User};

/// Activity label for rows whose category cannot be resolved.
pub const UNKNOWN_ACTIVITY: &str = "Unknown Activity";
/// Distribution bucket for reports whose category cannot be resolved.
pub const OTHER_CATEGORY: &str = "Other";
/// Placeholder for missing people and regions.
pub const UNKNOWN: &str = "Unknown";
/// Placeholder for rows without any usable date.
pub const NOT_AVAILABLE: &str = "N/A";

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Books distributed: a bare count as-is, a size breakdown summed, absent as 0.
pub fn book_count(value: Option<&BookCount>) -> u64 {
    value.map_or(0, BookCount::total)
}

/// New contacts met.
///
/// When the report carries a contact list, contacts flagged as new are
/// counted. If none carries a marker the whole list is assumed new; this is
/// an approximation for reports from clients that never set the flags.
/// Without a list the `newContacts` override is used, else 0.
pub fn new_contact_count(report: &ActivityReport) -> u64 {
    if let Some(contacts) = &report.contacts {
        let flagged = contacts.iter().filter(|c| c.is_marked_new()).count();
        return if flagged > 0 {
            flagged as u64
        } else {
            contacts.len() as u64
        };
    }
    report.new_contacts.unwrap_or(0)
}

/// Meals served: the reported figure if present, otherwise an estimate of
/// `floor(contacts * policy.prasadam_per_contact)`, otherwise 0.
pub fn prasadam_count(report: &ActivityReport, policy: &AggregationPolicy) -> u64 {
    if let Some(served) = report.prasadam_served {
        return served;
    }
    match &report.contacts {
        Some(contacts) => {
            let estimate = contacts.len() as f64 * policy.prasadam_per_contact;
            estimate.max(0.0).floor() as u64
        }
        None => 0,
    }
}

/// Category label: the category's `categoryName`, then the report's own
/// `categoryName`, then the category's `name`, else `fallback`.
pub fn category_name(
    category: Option<&PreachingCategory>,
    report: Option<&ActivityReport>,
    fallback: &str,
) -> String {
    category
        .and_then(|c| present(&c.category_name))
        .or_else(|| report.and_then(|r| present(&r.category_name)))
        .or_else(|| category.and_then(|c| present(&c.name)))
        .unwrap_or(fallback)
        .to_string()
}

/// Person label: `displayName`, then `name`, then `email`, else "Unknown".
pub fn display_name(user: Option<&User>) -> String {
    user.and_then(|u| {
        present(&u.display_name)
            .or_else(|| present(&u.name))
            .or_else(|| present(&u.email))
    })
    .unwrap_or(UNKNOWN)
    .to_string()
}

/// Regional grouping key: the author's temple, else "Unknown".
pub fn region_key(user: Option<&User>) -> String {
    user.and_then(|u| present(&u.temple))
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Date shown for a report.
///
/// The reporter's own `date` wins (text verbatim, native values formatted);
/// otherwise the creation timestamp as `YYYY-MM-DD`; otherwise "N/A".
pub fn display_date(report: &ActivityReport) -> String {
    let reported = report.date.as_ref().and_then(|date| match date {
        StoreTimestamp::Iso(text) if !text.is_empty() => Some(text.clone()),
        StoreTimestamp::Native(_) => date.to_date_string(),
        _ => None,
    });
    reported
        .or_else(|| report.created_at.as_ref().and_then(StoreTimestamp::to_date_string))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
