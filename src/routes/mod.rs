pub mod channels;
pub mod health;
pub mod proxy;

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Instant;
    use tower::ServiceExt;

    use crate::config::{CatalogConfig, Config};
    use crate::models::Source;
    use crate::services::catalog::CatalogService;
    use crate::services::fetcher::{PlaylistFetcher, RawPlaylists};
    use crate::{build_router, AppState};

    pub const GLOBAL: &str = "#EXTM3U\n\
        #EXTINF:-1 tvg-logo=\"l.png\" group-title=\"Sports\",ESPN HD\n\
        http://stream/espn.m3u8\n\
        #EXTINF:-1 group-title=\"News\",CNN\n\
        http://global/cnn.m3u8\n\
        #EXTINF:-1,Local One\n\
        http://global/local1.m3u8\n";

    pub const REGIONAL: &str = "#EXTM3U\n\
        #EXTINF:-1 group-title=\"News\",CNN\n\
        http://regional/cnn.m3u8\n\
        #EXTINF:-1,Spacetoon\n\
        http://regional/spacetoon.m3u8\n";

    /// State with no configured feeds; `loaded` installs the sample catalog
    pub async fn state(loaded: bool) -> Arc<AppState> {
        state_with(Config::from_env(), loaded).await
    }

    pub async fn state_with(config: Config, loaded: bool) -> Arc<AppState> {
        let fetcher = PlaylistFetcher::new("test", 1000, 0, 1).unwrap();
        let catalog = CatalogService::new(fetcher.clone(), Vec::new(), CatalogConfig::default(), 3_600_000);

        if loaded {
            let mut raw = RawPlaylists::new();
            raw.insert(Source::Global, GLOBAL.to_string());
            raw.insert(Source::Regional, REGIONAL.to_string());
            catalog.install(&raw).await;
        }

        Arc::new(AppState {
            config,
            fetcher,
            catalog,
            start_time: Instant::now(),
        })
    }

    pub async fn send(state: Arc<AppState>, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(state, "GET", uri).await;
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }
}
