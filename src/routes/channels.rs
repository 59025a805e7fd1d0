use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{CategoryBucket, ChannelRecord, Source};
use crate::services::catalog::Catalog;
use crate::services::fetcher::FetchError;
use crate::AppState;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn catalog_unavailable(e: FetchError) -> ApiError {
    tracing::error!("Failed to load channel catalog: {}", e);
    let status = if e.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(serde_json::json!({
            "error": "Failed to fetch playlists",
            "detail": e.to_string()
        })),
    )
}

async fn load_catalog(state: &AppState) -> Result<Arc<Catalog>, ApiError> {
    state.catalog.get().await.map_err(catalog_unavailable)
}

fn default_limit() -> usize {
    500
}

/// Query parameters for the channels endpoint
#[derive(Debug, Deserialize)]
pub struct ChannelsQuery {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

/// Paginated channels response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsResponse {
    pub channels: Vec<ChannelRecord>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// One category with its resolved channels
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub name: String,
    pub capacity: usize,
    pub count: usize,
    pub channels: Vec<ChannelRecord>,
}

impl CategoryView {
    fn from_bucket(bucket: &CategoryBucket, channels: &[ChannelRecord]) -> Self {
        Self {
            name: bucket.name.clone(),
            capacity: bucket.capacity,
            count: bucket.len(),
            channels: bucket.resolve(channels).into_iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryView>,
    pub total_channels: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub channels: usize,
    pub categorized: usize,
}

/// GET /api/channels - all unique channels in merge order
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChannelsQuery>,
) -> Result<Json<ChannelsResponse>, ApiError> {
    let source = match query.source.as_deref() {
        Some(tag) => Some(Source::from_tag(tag).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("Unknown source: {}", tag) })),
            )
        })?),
        None => None,
    };

    let catalog = load_catalog(&state).await?;
    let limit = query.limit.min(state.config.max_channels_page);

    let filtered: Vec<&ChannelRecord> = catalog
        .channels
        .iter()
        .filter(|c| source.map_or(true, |s| c.source == s))
        .collect();

    let total = filtered.len();
    let channels: Vec<ChannelRecord> = filtered
        .into_iter()
        .skip(query.offset)
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(ChannelsResponse {
        has_more: query.offset.saturating_add(channels.len()) < total,
        channels,
        total,
        limit,
        offset: query.offset,
    }))
}

/// GET /api/categories - every bucket in taxonomy order, catch-all last
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let catalog = load_catalog(&state).await?;

    let categories = catalog
        .categories
        .iter()
        .map(|bucket| CategoryView::from_bucket(bucket, &catalog.channels))
        .collect();

    Ok(Json(CategoriesResponse {
        categories,
        total_channels: catalog.channels.len(),
    }))
}

/// GET /api/categories/:name
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CategoryView>, ApiError> {
    let catalog = load_catalog(&state).await?;

    let bucket = catalog.categories.get(&name).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("Unknown category: {}", name) })),
        )
    })?;

    Ok(Json(CategoryView::from_bucket(bucket, &catalog.channels)))
}

/// POST /api/catalog/refresh - refetch all feeds and rebuild
pub async fn refresh_catalog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let catalog = state.catalog.refresh().await.map_err(catalog_unavailable)?;

    tracing::info!("Catalog refreshed on request ({} channels)", catalog.channels.len());

    Ok(Json(RefreshResponse {
        channels: catalog.channels.len(),
        categorized: catalog.categories.total_categorized(),
    }))
}
