//! Dashboard HTTP Server Binary
//!
//! Main entry point for the dashboard REST API. Loads configuration, opens the
//! store, sets up the router and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Use a configuration file
//! DASHBOARD_CONFIG=backend/dashboard.toml cargo run --bin dashboard-server
//!
//! # Or configure the store from the environment
//! DASHBOARD_PROJECT_ID=ministry DASHBOARD_API_KEY=... \
//!   DASHBOARD_SEED_FILE=backend/data/seed.json cargo run --bin dashboard-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `DASHBOARD_CONFIG`: Path to `dashboard.toml` (default: searched in the
//!   standard locations, then the `DASHBOARD_*` store variables are used)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ministry_dashboard::config::{AggregationPolicy, DashboardConfig};
use ministry_dashboard::db::{StoreConfig, StoreFactory};
use ministry_dashboard::http::{create_router, AppState};
use ministry_dashboard::services::DashboardService;

fn load_config() -> anyhow::Result<DashboardConfig> {
    if let Ok(path) = env::var("DASHBOARD_CONFIG") {
        return DashboardConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path));
    }

    match DashboardConfig::from_default_location() {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!("{}; falling back to environment variables", e);
            let store = StoreConfig::from_env().context("Store configuration missing")?;
            Ok(DashboardConfig {
                store,
                aggregation: AggregationPolicy::default(),
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting dashboard HTTP server");

    let config = load_config()?;
    info!("Configuration loaded: {:?}", config.store);

    let store = StoreFactory::create(&config.store).context("Failed to open store")?;
    let service = DashboardService::with_policy(store, config.aggregation);
    let app = create_router(AppState::new(service));

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
