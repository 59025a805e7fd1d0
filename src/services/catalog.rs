use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::config::CatalogConfig;
use crate::models::{CategorizedChannels, ChannelRecord, Source};
use crate::services::categorizer::categorize;
use crate::services::fetcher::{FetchError, PlaylistFetcher, RawPlaylists};
use crate::services::m3u_parser::parse_playlist;
use crate::services::merger::{merge_sources, SourceBatch};

/// Minimum wait between upstream attempts after a failed rebuild
const REFRESH_FAILURE_BACKOFF_MS: i64 = 30_000;

lazy_static! {
    static ref CATALOG_BUILDS: IntCounter =
        register_int_counter!("catalog_builds_total", "Number of catalog rebuilds").unwrap();
    static ref UNIQUE_CHANNELS: IntGauge =
        register_int_gauge!("catalog_unique_channels", "Unique channels in the current catalog").unwrap();
}

/// Result of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    /// Unique channels in merge order ("all channels" view)
    pub channels: Vec<ChannelRecord>,
    /// Bounded topical buckets indexing into `channels`
    pub categories: CategorizedChannels,
}

/// Parse every source, merge by priority and categorize.
///
/// Pure function of its inputs: the same raw texts and config always
/// give the same catalog.
pub fn build_catalog(raw: &RawPlaylists, config: &CatalogConfig) -> Catalog {
    let batches: Vec<SourceBatch> = raw
        .iter()
        .map(|(&source, text)| SourceBatch::new(source, parse_playlist(text, source)))
        .collect();

    let channels = merge_sources(batches, &config.source_priority);
    let categories = categorize(&channels, &config.taxonomy);

    tracing::info!(
        "Catalog built: {} unique channels, {} categorized",
        channels.len(),
        categories.total_categorized()
    );

    Catalog {
        channels,
        categories,
    }
}

struct CachedCatalog {
    catalog: Arc<Catalog>,
    built_at: DateTime<Utc>,
}

/// Fetches the configured feeds and keeps the latest catalog in memory
pub struct CatalogService {
    fetcher: PlaylistFetcher,
    sources: Vec<(Source, String)>,
    config: CatalogConfig,
    ttl: Duration,
    cache: RwLock<Option<CachedCatalog>>,
    refresh_lock: Mutex<()>,
    last_failed_at: RwLock<Option<DateTime<Utc>>>,
}

impl CatalogService {
    pub fn new(
        fetcher: PlaylistFetcher,
        sources: Vec<(Source, String)>,
        config: CatalogConfig,
        ttl_ms: u64,
    ) -> Self {
        Self {
            fetcher,
            sources,
            config,
            ttl: Duration::milliseconds(ttl_ms.min(i64::MAX as u64) as i64),
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            last_failed_at: RwLock::new(None),
        }
    }

    /// Current catalog and when it was built, without fetching
    pub async fn snapshot(&self) -> Option<(Arc<Catalog>, DateTime<Utc>)> {
        self.cache
            .read()
            .await
            .as_ref()
            .map(|c| (c.catalog.clone(), c.built_at))
    }

    async fn fresh(&self) -> Option<Arc<Catalog>> {
        let cache = self.cache.read().await;
        let fresh = cache
            .as_ref()
            .filter(|c| Utc::now() - c.built_at < self.ttl)
            .map(|c| c.catalog.clone());
        fresh
    }

    /// Build a catalog from already-fetched text and make it current
    pub async fn install(&self, raw: &RawPlaylists) -> Arc<Catalog> {
        let catalog = Arc::new(build_catalog(raw, &self.config));

        CATALOG_BUILDS.inc();
        UNIQUE_CHANNELS.set(catalog.channels.len() as i64);

        *self.cache.write().await = Some(CachedCatalog {
            catalog: catalog.clone(),
            built_at: Utc::now(),
        });
        catalog
    }

    async fn in_failure_backoff(&self) -> bool {
        let last_failed_at = *self.last_failed_at.read().await;
        last_failed_at.map_or(false, |at| {
            Utc::now() - at < Duration::milliseconds(REFRESH_FAILURE_BACKOFF_MS)
        })
    }

    async fn fetch_and_install(&self) -> Result<Arc<Catalog>, FetchError> {
        match self.fetcher.fetch_sources(&self.sources).await {
            Ok(raw) => {
                *self.last_failed_at.write().await = None;
                Ok(self.install(&raw).await)
            }
            Err(e) => {
                *self.last_failed_at.write().await = Some(Utc::now());
                Err(e)
            }
        }
    }

    /// Fetch all feeds and rebuild, regardless of cache age
    pub async fn refresh(&self) -> Result<Arc<Catalog>, FetchError> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_install().await
    }

    /// Cached catalog while fresh; otherwise rebuild.
    ///
    /// With a stale catalog in memory, callers never queue behind an
    /// upstream fetch: while another rebuild runs, or within the backoff
    /// window after a failed one, the stale catalog is returned at once.
    /// A failed rebuild also falls back to the stale catalog.
    pub async fn get(&self) -> Result<Arc<Catalog>, FetchError> {
        if let Some(catalog) = self.fresh().await {
            return Ok(catalog);
        }

        let stale = self.snapshot().await.map(|(catalog, _)| catalog);

        let _guard = match (self.refresh_lock.try_lock(), &stale) {
            (Ok(guard), _) => guard,
            (Err(_), Some(stale)) => return Ok(stale.clone()),
            // Nothing to serve yet: wait for the rebuild in progress
            (Err(_), None) => self.refresh_lock.lock().await,
        };

        // Another request may have rebuilt while we waited
        if let Some(catalog) = self.fresh().await {
            return Ok(catalog);
        }

        if let Some(stale) = &stale {
            if self.in_failure_backoff().await {
                return Ok(stale.clone());
            }
        }

        match self.fetch_and_install().await {
            Ok(catalog) => Ok(catalog),
            Err(e) => match self.snapshot().await {
                Some((stale, built_at)) => {
                    tracing::warn!("Catalog refresh failed ({}); serving catalog from {}", e, built_at);
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }
}
