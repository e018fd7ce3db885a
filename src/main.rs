// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::aggregator::Aggregator;
use crate::application::clock::{Clock, SystemClock};
use crate::application::dashboard_cache::{CacheStore, DashboardCache};
use crate::application::dashboard_service::{DashboardService, DashboardSettings};
use crate::infrastructure::api_client::RestApiClient;
use crate::infrastructure::cache_store::{FileCacheStore, MemoryCacheStore};
use crate::infrastructure::config::{CacheBackend, load_app_config};
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

const ADMIN_CACHE_NAME: &str = "admin-dashboard";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create resource client (infrastructure layer)
    let repository = Arc::new(RestApiClient::new(
        &config.api.base_url,
        config.api.token.clone(),
        config.api.timeout(),
    ));

    let store: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::File => Arc::new(FileCacheStore::new(&config.cache.dir)),
        CacheBackend::Memory => Arc::new(MemoryCacheStore::default()),
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Create services (application layer)
    let dashboard_service = DashboardService::new(
        repository,
        Aggregator::new(config.api.timeout()),
        clock.clone(),
        DashboardSettings::from(&config.dashboard),
    );
    let admin_cache = DashboardCache::new(store, clock, ADMIN_CACHE_NAME, config.cache.ttl());

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        admin_cache,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(
        "Starting attendance-dashboard on {} (backend {}, cache ttl {}s)",
        addr,
        config.api.base_url,
        config.cache.ttl_secs
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
