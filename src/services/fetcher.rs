use futures::future::join_all;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use crate::models::Source;

/// Raw playlist text keyed by the feed it came from
pub type RawPlaylists = HashMap<Source, String>;

/// Errors raised while retrieving playlist text
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Playlist too large: {size_mb:.1}MB (limit {limit_mb}MB)")]
    TooLarge { size_mb: f64, limit_mb: usize },

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Network(e) if e.is_timeout())
    }
}

/// Exponential backoff, capped at 10s
fn backoff_ms(attempt: u32) -> u64 {
    (1u64 << attempt.min(20)).saturating_mul(500).min(10_000)
}

/// HTTP supplier of raw playlist documents
#[derive(Clone)]
pub struct PlaylistFetcher {
    client: Client,
    max_retries: u32,
    max_m3u_size_mb: usize,
}

impl PlaylistFetcher {
    pub fn new(
        user_agent: &str,
        timeout_ms: u64,
        max_retries: u32,
        max_m3u_size_mb: usize,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_millis(timeout_ms))
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_retries,
            max_m3u_size_mb,
        })
    }

    /// GET a playlist as text, retrying network failures and 429s
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0u32;

        loop {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        if let Some(len) = resp.content_length() {
                            let max_bytes = (self.max_m3u_size_mb as u64) * 1024 * 1024;
                            if len > max_bytes {
                                return Err(FetchError::TooLarge {
                                    size_mb: len as f64 / 1024f64 / 1024f64,
                                    limit_mb: self.max_m3u_size_mb,
                                });
                            }
                        }

                        let body = resp.text().await?;
                        tracing::info!("Success fetching {}, length: {}", url, body.len());
                        return Ok(body);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                        let wait = backoff_ms(attempt);
                        tracing::warn!("fetch_retry" = attempt + 1, "reason" = "429", "backoff_ms" = wait);
                        attempt += 1;
                        sleep(Duration::from_millis(wait)).await;
                        continue;
                    }

                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        reason: status.canonical_reason().unwrap_or("Error").to_string(),
                    });
                }
                Err(err) => {
                    if attempt < self.max_retries {
                        let wait = backoff_ms(attempt);
                        tracing::warn!("fetch_retry" = attempt + 1, "reason" = "network", "backoff_ms" = wait);
                        attempt += 1;
                        sleep(Duration::from_millis(wait)).await;
                        continue;
                    }
                    tracing::error!("Error fetching {}: {}", url, err);
                    return Err(err.into());
                }
            }
        }
    }

    /// Fetch every configured feed concurrently.
    /// Fails as a whole if any single feed fails.
    pub async fn fetch_sources(&self, sources: &[(Source, String)]) -> Result<RawPlaylists, FetchError> {
        let results = join_all(sources.iter().map(|(source, url)| async move {
            self.fetch_text(url).await.map(|text| (*source, text))
        }))
        .await;

        let mut raw = RawPlaylists::new();
        for result in results {
            let (source, text) = result?;
            tracing::info!("{} raw length: {}", source, text.len());
            raw.insert(source, text);
        }
        Ok(raw)
    }
}
