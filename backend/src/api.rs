//! Public API surface for the dashboard backend.
//!
//! Derived views produced by the aggregation services. All types derive
//! Serialize/Deserialize and use camelCase field names, matching what the
//! dashboard charts consume.

use serde::{Deserialize, Serialize};

pub use crate::models::{
    ActivityReport, BookCount, BookSizes, CategoryMap, Contact, PreachingCategory, Resource,
    StoreTimestamp, User, UserMap, UserRole,
};

/// Headline impact numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactTotals {
    pub total_reports: usize,
    pub total_books_distributed: u64,
    pub lives_touched: u64,
    pub total_prasadam_served: u64,
    /// Size of the user directory.
    pub active_preachers: usize,
    /// Distinct temples among users who submitted at least one report.
    pub cities_covered: usize,
}

/// One row of the recent activity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityRow {
    pub id: String,
    pub date: String,
    pub activity: String,
    pub preacher: String,
    pub temple: String,
    pub books_distributed: u64,
    pub prasadam_served: u64,
    pub new_contacts: u64,
}

/// Per-region chart series as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalSeries {
    pub labels: Vec<String>,
    pub books: Vec<u64>,
    pub prasadam: Vec<u64>,
    pub events: Vec<u64>,
}

impl RegionalSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One slice of the category distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: u64,
}

impl CategorySlice {
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// All four derived views computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub impact: ImpactTotals,
    pub recent_activity: Vec<RecentActivityRow>,
    pub regions: RegionalSeries,
    pub categories: Vec<CategorySlice>,
}
