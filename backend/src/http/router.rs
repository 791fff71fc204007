//! Router configuration for the HTTP API.
//!
//! Sets up all routes, middleware (CORS, compression, tracing) and creates
//! the axum router ready for serving.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS: the dashboard frontend is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Dashboard views
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/dashboard/impact", get(handlers::get_impact))
        .route("/dashboard/recent", get(handlers::get_recent_activity))
        .route("/dashboard/regions", get(handlers::get_regions))
        .route("/dashboard/categories", get(handlers::get_categories))
        // Cache management
        .route("/cache/clear", post(handlers::clear_cache))
        // Users and resources
        .route("/users/{user_id}/reports", get(handlers::get_user_reports))
        .route("/users/{user_id}/role", get(handlers::get_user_role))
        .route("/resources", get(handlers::list_resources))
        // Live feed
        .route("/reports/live", get(handlers::stream_live_reports));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
