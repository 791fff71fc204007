//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`DashboardService`](crate::services::DashboardService).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;

use super::dto::{
    CacheStatusResponse, CategorySlice, DashboardData, HealthResponse, ImpactTotals,
    RecentActivityRow, RecentQuery, RegionalSeries, UserRoleResponse, MAX_RECENT_LIMIT,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{ActivityReport, Resource};
use crate::services::aggregation;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn recent_limit(query: &RecentQuery) -> Result<Option<usize>, AppError> {
    match query.limit {
        Some(limit) if limit > MAX_RECENT_LIMIT => Err(AppError::BadRequest(format!(
            "limit must be at most {}",
            MAX_RECENT_LIMIT
        ))),
        limit => Ok(limit),
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let store_status = match state.service.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        store: store_status,
    }))
}

// =============================================================================
// Dashboard views
// =============================================================================

/// GET /v1/dashboard?limit=N
///
/// All four views computed from one snapshot.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> HandlerResult<DashboardData> {
    let limit = recent_limit(&query)?;
    Ok(Json(state.service.dashboard(limit).await))
}

/// GET /v1/dashboard/impact
pub async fn get_impact(State(state): State<AppState>) -> HandlerResult<ImpactTotals> {
    Ok(Json(state.service.impact_totals().await))
}

/// GET /v1/dashboard/recent?limit=N
pub async fn get_recent_activity(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> HandlerResult<Vec<RecentActivityRow>> {
    let limit = recent_limit(&query)?;
    Ok(Json(state.service.recent_activity(limit).await))
}

/// GET /v1/dashboard/regions
pub async fn get_regions(State(state): State<AppState>) -> HandlerResult<RegionalSeries> {
    Ok(Json(state.service.regional_series().await))
}

/// GET /v1/dashboard/categories
pub async fn get_categories(State(state): State<AppState>) -> HandlerResult<Vec<CategorySlice>> {
    Ok(Json(state.service.category_distribution().await))
}

/// POST /v1/cache/clear
///
/// Drop the cached snapshot so the next request re-queries the store.
pub async fn clear_cache(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CacheStatusResponse>), AppError> {
    state.service.clear_cache();
    let cache = state.service.cache();
    Ok((
        StatusCode::OK,
        Json(CacheStatusResponse {
            valid: cache.is_valid(),
            fetched_at: cache.fetched_at(),
        }),
    ))
}

// =============================================================================
// Users and resources
// =============================================================================

/// GET /v1/users/{user_id}/reports
pub async fn get_user_reports(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> HandlerResult<Vec<ActivityReport>> {
    Ok(Json(state.service.reports_for_user(&user_id).await))
}

/// GET /v1/users/{user_id}/role
pub async fn get_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> HandlerResult<UserRoleResponse> {
    let role = state
        .service
        .user_role(&user_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No role recorded for user {}", user_id)))?;

    Ok(Json(UserRoleResponse {
        user_id,
        is_admin: role.is_privileged(),
        role: role.to_string(),
    }))
}

/// GET /v1/resources
pub async fn list_resources(State(state): State<AppState>) -> HandlerResult<Vec<Resource>> {
    Ok(Json(state.service.resources().await))
}

// =============================================================================
// Live feed
// =============================================================================

/// GET /v1/reports/live
///
/// Server-sent events carrying fresh impact totals each time the reports
/// collection changes. The first event reflects the current contents.
pub async fn stream_live_reports(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<ActivityReport>>();
    let handle = state
        .service
        .change_feed()
        .watch_reports(move |reports| {
            // The receiver is gone once the client disconnects.
            let _ = tx.send(reports);
        })
        .await;

    let service = state.service.clone();
    let stream = async_stream::stream! {
        // Dropping the stream (client disconnected) drops the handle, which
        // cancels the feed.
        let _handle = handle;
        while let Some(reports) = rx.recv().await {
            let users = service.users().await;
            let totals = aggregation::compute_impact_totals(&reports, &users, service.policy());
            let data = serde_json::to_string(&totals).unwrap_or_default();
            yield Ok(Event::default().event("impact").data(data));
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
