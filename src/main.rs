/// Launch feed service entry point
mod clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod repo;
mod routes;
mod services;
mod utils;

use crate::clients::{LaunchLibraryClient, LaunchSource};
use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::repo::{init_db, MemoryPreferenceRepo, PgPreferenceRepo, PreferenceBackend};
use crate::routes::build_router;
use crate::services::{LaunchFeedAggregator, LoadOutcome, PreferenceStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    let backend = preference_backend(&config).await;
    let preferences = PreferenceStore::new(backend, config.preferences_key.clone());

    // Initialize clients
    let client = LaunchLibraryClient::new(config.launch_api_url.clone(), &config.http)?;
    info!("Using launch API at {}", client.base_url());
    let source: Arc<dyn LaunchSource> = Arc::new(client);

    let feed = Arc::new(LaunchFeedAggregator::new(source, preferences));
    start_initial_load(feed.clone());

    // Build router
    let app = build_router(AppState { feed });

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("launch_tracker listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Postgres when configured and reachable, otherwise process memory
async fn preference_backend(config: &AppConfig) -> Arc<dyn PreferenceBackend> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL not set, filter preferences will not survive a restart");
        return Arc::new(MemoryPreferenceRepo::new());
    };

    match connect_preferences(url).await {
        Ok(repo) => Arc::new(repo),
        Err(e) => {
            warn!("Preference database unavailable, using memory store: {}", e);
            Arc::new(MemoryPreferenceRepo::new())
        }
    }
}

async fn connect_preferences(url: &str) -> anyhow::Result<PgPreferenceRepo> {
    let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
    info!("Database connection pool established");

    init_db(&pool).await?;
    info!("Database schema initialized");

    Ok(PgPreferenceRepo::new(pool))
}

/// Restore saved filters and load the first page without delaying startup
fn start_initial_load(feed: Arc<LaunchFeedAggregator>) {
    tokio::spawn(async move {
        match feed.initialize().await {
            LoadOutcome::Failed { message } => warn!("Initial launch load failed: {}", message),
            outcome => info!("Initial launch load finished: {:?}", outcome),
        }
    });
}
