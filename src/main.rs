mod config;
mod models;
mod routes;
mod services;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{catalog::CatalogService, fetcher::PlaylistFetcher};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub fetcher: PlaylistFetcher,
    pub catalog: CatalogService,
    pub start_time: Instant,
}

/// Build the HTTP router over shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/ready", get(routes::health::ready))
        .route("/live", get(routes::health::live))
        // Catalog endpoints
        .route("/api/channels", get(routes::channels::list_channels))
        .route("/api/categories", get(routes::channels::list_categories))
        .route("/api/categories/:name", get(routes::channels::get_category))
        .route("/api/catalog/refresh", post(routes::channels::refresh_catalog))
        // Raw playlist proxy
        .route("/api/proxy-m3u", get(routes::proxy::proxy_m3u))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "streamdeck_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting StreamDeck Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Sources: global={} regional={}",
        config.global_playlist_url,
        config.regional_playlist_url
    );

    let fetcher = PlaylistFetcher::new(
        &config.user_agent,
        config.fetch_timeout_ms,
        config.max_retries,
        config.max_m3u_size_mb,
    )
    .context("Failed to initialize playlist fetcher")?;

    let catalog = CatalogService::new(
        fetcher.clone(),
        config.sources(),
        config.catalog.clone(),
        config.catalog_ttl_ms,
    );
    tracing::info!(
        "Catalog service initialized (categories: {}; ttl {}ms)",
        config.catalog.taxonomy.bucket_names().join(", "),
        config.catalog_ttl_ms
    );

    let state = Arc::new(AppState {
        config,
        fetcher,
        catalog,
        start_time: Instant::now(),
    });

    // Warm the catalog in the background; requests build it on demand otherwise
    let warm_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = warm_state.catalog.get().await {
            tracing::warn!("Initial catalog load failed: {}", e);
        }
    });

    let app = build_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
