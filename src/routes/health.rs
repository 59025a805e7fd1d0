use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "StreamDeck Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "runtime": "rust"
    }))
}

/// Catalog stats
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogStats {
    loaded: bool,
    channels: usize,
    categorized: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    built_at: Option<String>,
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    uptime: u64,
    catalog: CatalogStats,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    let catalog = match state.catalog.snapshot().await {
        Some((catalog, built_at)) => CatalogStats {
            loaded: true,
            channels: catalog.channels.len(),
            categorized: catalog.categories.total_categorized(),
            built_at: Some(built_at.to_rfc3339()),
        },
        None => CatalogStats {
            loaded: false,
            channels: 0,
            categorized: 0,
            built_at: None,
        },
    };

    // Catalog is loaded lazily, so a missing one only degrades
    let status = if catalog.loaded { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        uptime,
        catalog,
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                b"Internal Server Error".to_vec(),
            )
        }
    }
}

/// Readiness probe: ready once a catalog has been built
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.catalog.snapshot().await.is_some() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready - catalog not loaded")
    }
}

/// Liveness probe
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}
