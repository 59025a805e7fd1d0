use anyhow::{Context, Result};
use std::env;
use std::path::Path;

use crate::models::{Source, Taxonomy};

const DEFAULT_GLOBAL_PLAYLIST_URL: &str = "https://iptv-org.github.io/iptv/index.m3u";
const DEFAULT_REGIONAL_PLAYLIST_URL: &str =
    "https://raw.githubusercontent.com/hemzaberkane/ARAB-IPTV/refs/heads/main/ARABIPTV.m3u";

/// Pipeline configuration handed to the catalog builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub taxonomy: Taxonomy,
    /// Merge precedence, highest priority first
    pub source_priority: Vec<Source>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            taxonomy: Taxonomy::default(),
            source_priority: vec![Source::Regional, Source::Global],
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Fetching
    pub fetch_timeout_ms: u64,
    pub max_retries: u32,
    pub max_m3u_size_mb: usize,
    pub user_agent: String,

    // Sources
    pub global_playlist_url: String,
    pub regional_playlist_url: String,

    // Catalog
    pub catalog_ttl_ms: u64,
    pub catalog: CatalogConfig,

    // Pagination
    pub max_channels_page: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a taxonomy from a JSON file
pub fn load_taxonomy(path: impl AsRef<Path>) -> Result<Taxonomy> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read taxonomy file {}", path.display()))?;
    let taxonomy = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid taxonomy JSON in {}", path.display()))?;
    Ok(taxonomy)
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let taxonomy = match env::var("CATEGORY_TAXONOMY_PATH") {
            Ok(path) if !path.trim().is_empty() => match load_taxonomy(path.trim()) {
                Ok(taxonomy) => {
                    tracing::info!("Loaded category taxonomy from {}", path.trim());
                    taxonomy
                }
                Err(e) => {
                    tracing::warn!("{:#}; using default taxonomy", e);
                    Taxonomy::default()
                }
            },
            _ => Taxonomy::default(),
        };

        Self {
            // Server
            port: env_or("PORT", 3001),

            // Fetching
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", 10_000),
            max_retries: env_or("MAX_RETRIES", 2),
            max_m3u_size_mb: env_or("MAX_M3U_SIZE_MB", 50),
            // Browser user agent, some playlist hosts reject unknown clients
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
            }),

            // Sources
            global_playlist_url: env::var("GLOBAL_PLAYLIST_URL")
                .unwrap_or_else(|_| DEFAULT_GLOBAL_PLAYLIST_URL.to_string()),
            regional_playlist_url: env::var("REGIONAL_PLAYLIST_URL")
                .unwrap_or_else(|_| DEFAULT_REGIONAL_PLAYLIST_URL.to_string()),

            // Catalog
            catalog_ttl_ms: env_or("CATALOG_TTL_MS", 3_600_000), // 1 hour
            catalog: CatalogConfig {
                taxonomy,
                ..CatalogConfig::default()
            },

            // Pagination
            max_channels_page: env_or("MAX_CHANNELS_PAGE", 5_000),
        }
    }

    /// Configured feeds with their URLs
    pub fn sources(&self) -> Vec<(Source, String)> {
        vec![
            (Source::Global, self.global_playlist_url.clone()),
            (Source::Regional, self.regional_playlist_url.clone()),
        ]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
