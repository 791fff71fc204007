//! Service layer for the dashboard.
//!
//! Sits between the store abstractions in [`crate::db`] and the HTTP layer.
//! Fetchers talk to the store, the cache remembers what they returned, the
//! normalizers and aggregation turn it into chart-ready views, and
//! [`DashboardService`] ties them together.

pub mod aggregation;
pub mod cache;
pub mod change_feed;
pub mod dashboard;
pub mod fetchers;
pub mod normalize;
pub mod uploads;

pub use aggregation::{
    compute_category_distribution, compute_dashboard, compute_impact_totals,
    compute_recent_activity, compute_regional_series,
};
pub use cache::{Cache, CacheSnapshot, CachedCollection, Snapshot, CACHE_TTL};
pub use change_feed::{ChangeFeed, FeedCallback, FeedHandle};
pub use dashboard::DashboardService;
pub use fetchers::{
    fetch_categories, fetch_reports, fetch_reports_for_user, fetch_resources, fetch_users,
};
pub use uploads::{
    delete_uploaded_file, publish_resource, upload_report_image, upload_resource_file,
    UploadFile, UploadedFile, MAX_IMAGE_BYTES, MAX_RESOURCE_BYTES,
};
