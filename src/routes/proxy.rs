use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::services::fetcher::FetchError;
use crate::AppState;

/// Query parameters for the playlist proxy
#[derive(Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub url: Option<String>,
}

/// Accept only absolute http/https URLs
fn is_valid_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// GET /api/proxy-m3u?url=<encoded>
/// Returns the raw playlist text so browser clients can bypass CORS.
pub async fn proxy_m3u(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let url = match query.url.as_deref().map(str::trim) {
        Some(u) if !u.is_empty() => u.to_string(),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "URL is required" })),
            ))
        }
    };

    if !is_valid_http_url(&url) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Invalid url parameter" })),
        ));
    }

    tracing::info!("Proxying request for: {}", url);

    let body = state.fetcher.fetch_text(&url).await.map_err(|e| {
        tracing::error!("Error fetching {}: {}", url, e);
        let status = match &e {
            FetchError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            e if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(serde_json::json!({
                "error": "Error fetching M3U",
                "detail": e.to_string()
            })),
        )
    })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
        .into_response())
}
