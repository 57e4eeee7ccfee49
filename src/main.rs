use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use invite_analytics::analytics::{AnalyticsService, SessionSweeper};
use invite_analytics::auth::AuthService;
use invite_analytics::config::Config;
use invite_analytics::storage::{self, CachedStorage, Storage};
use invite_analytics::{api, invite};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let backend = storage::open(&config.database).await?;
    info!("Database initialized successfully");

    let storage: Arc<dyn Storage> = Arc::new(CachedStorage::new(
        backend,
        config.cache.profile_max_entries,
        config.cache.profile_ttl_secs,
    ));
    let analytics = Arc::new(AnalyticsService::new(Arc::clone(&storage)));

    // Initialize admin auth
    let auth_service = Arc::new(AuthService::new(&config.auth));
    if !auth_service.is_enabled() {
        warn!("🔓 Admin authentication is disabled - all admin requests are allowed");
    } else if config.auth.api_keys.is_empty() {
        warn!("🔐 Admin authentication enabled but ADMIN_API_KEYS is empty - admin API is locked");
    } else {
        info!(
            "🔐 Admin API key authentication enabled ({} keys)",
            config.auth.api_keys.len()
        );
    }

    let sweeper = SessionSweeper::spawn(
        Arc::clone(&storage),
        config.analytics.session_sweep_interval_secs,
    );
    info!(
        "🧹 Expired sessions swept every {}s",
        config.analytics.session_sweep_interval_secs
    );

    // Create routers
    let invite_router = invite::create_invite_router(Arc::clone(&analytics));
    let api_router = api::create_api_router(Arc::clone(&analytics), auth_service);

    // Start public tracking server
    let public_addr = format!("{}:{}", config.public_server.host, config.public_server.port);
    let public_listener = tokio::net::TcpListener::bind(&public_addr).await?;
    info!("🚀 Tracking server listening on http://{}", public_addr);

    // Start admin server
    let admin_addr = format!("{}:{}", config.admin_server.host, config.admin_server.port);
    let admin_listener = tokio::net::TcpListener::bind(&admin_addr).await?;
    info!("🚀 Admin server listening on http://{}", admin_addr);
    info!("   - Analytics available at http://{}/api/admin/profiles/{{id}}/analytics", admin_addr);

    // Run both servers until one fails or ctrl-c
    let result = tokio::select! {
        served = async {
            tokio::try_join!(
                axum::serve(public_listener, invite_router),
                axum::serve(admin_listener, api_router),
            )
        } => served.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    sweeper.shutdown().await;
    result?;

    Ok(())
}
