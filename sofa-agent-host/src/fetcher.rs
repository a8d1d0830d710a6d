//! Conditional feed retrieval with cache fallback
//!
//! Branches, in order:
//! - cache directory cannot be created: fail before any network activity
//! - 304 Not Modified: serve the cached body, which must exist and parse
//! - 200 OK: persist body and ETag (best effort), serve the fresh body
//! - anything else, including transport failures: serve the cached body
//!   with a warning, fail only when there is nothing cached

use reqwest::header::{ETAG, IF_NONE_MATCH, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::{CacheConfig, FeedConfig};
use crate::error::{BodyOrigin, FeedError};
use crate::feed::FeedDocument;

/// Which branch produced the returned document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Network,
    NotModified,
    StaleCache,
}

pub struct FeedFetcher {
    url: String,
    user_agent: String,
    client: reqwest::Client,
    cache: CacheStore,
}

impl FeedFetcher {
    pub fn new(feed: &FeedConfig, cache: &CacheConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(feed.timeout())
            .build()
            .map_err(FeedError::Client)?;

        Ok(Self {
            url: feed.url.clone(),
            user_agent: feed.user_agent.clone(),
            client,
            cache: CacheStore::new(cache),
        })
    }

    pub async fn fetch(&self) -> Result<FeedDocument, FeedError> {
        self.fetch_with_source().await.map(|(doc, _)| doc)
    }

    pub async fn fetch_with_source(&self) -> Result<(FeedDocument, FeedSource), FeedError> {
        self.cache.ensure_directory().await.map_err(FeedError::CacheDirectory)?;

        let token = self.cache.load_token().await;

        let mut request = self.client.get(&self.url).header(USER_AGENT, &self.user_agent);
        if let Some(token) = &token {
            debug!("Sending If-None-Match: {}", token);
            request = request.header(IF_NONE_MATCH, token.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = format!("failed to make request: {}", e);
                return self.fall_back_to_cache(reason).await;
            }
        };

        match response.status() {
            StatusCode::NOT_MODIFIED => {
                info!("Feed not modified, using cached data");
                let body = self.cache.load_body().await.ok_or(FeedError::CacheInconsistent)?;
                let doc = parse(&body, BodyOrigin::Cache)?;
                log_feed_metadata(&doc, FeedSource::NotModified);
                Ok((doc, FeedSource::NotModified))
            }
            StatusCode::OK => {
                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                let body = match response.bytes().await {
                    Ok(body) => body,
                    Err(e) => {
                        let reason = format!("failed to read response body: {}", e);
                        return self.fall_back_to_cache(reason).await;
                    }
                };

                info!("Fetched fresh feed data ({} bytes)", body.len());
                self.persist(&body, etag.as_deref()).await;

                let doc = parse(&body, BodyOrigin::Network)?;
                log_feed_metadata(&doc, FeedSource::Network);
                Ok((doc, FeedSource::Network))
            }
            status => {
                let reason = format!("failed to fetch feed data (HTTP {})", status.as_u16());
                self.fall_back_to_cache(reason).await
            }
        }
    }

    /// Best effort: failures are logged, never returned
    async fn persist(&self, body: &[u8], etag: Option<&str>) {
        if let Err(e) = self.cache.store_body(body).await {
            warn!("Failed to cache feed data: {}", e);
            // The body file may hold the new data even if the write reported failure
            if let Err(e) = self.cache.clear_token().await {
                warn!("Failed to drop cached ETag: {}", e);
            }
            return;
        }

        let result = match etag.map(str::trim).filter(|t| !t.is_empty()) {
            Some(etag) => self.cache.store_token(etag).await,
            None => {
                debug!("Response carried no ETag, dropping cached token");
                self.cache.clear_token().await
            }
        };

        if let Err(e) = result {
            warn!("Failed to cache ETag: {}", e);
        }
    }

    async fn fall_back_to_cache(
        &self,
        reason: String,
    ) -> Result<(FeedDocument, FeedSource), FeedError> {
        let Some(body) = self.cache.load_body().await else {
            return Err(FeedError::Unavailable { reason });
        };

        match self.cache.body_modified().await {
            Some(modified) => warn!(
                "{}, using cached data from {}",
                reason,
                modified.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => warn!("{}, using cached data", reason),
        }

        let doc = parse(&body, BodyOrigin::Cache)?;
        log_feed_metadata(&doc, FeedSource::StaleCache);
        Ok((doc, FeedSource::StaleCache))
    }
}

fn log_feed_metadata(doc: &FeedDocument, source: FeedSource) {
    debug!(
        "Serving feed from {:?} - update hash: {}, last check: {}, {} OS versions, {} models",
        source,
        doc.update_hash.as_deref().unwrap_or("none"),
        doc.last_check.as_deref().unwrap_or("unknown"),
        doc.os_versions.len(),
        doc.models.len()
    );
}

fn parse(body: &[u8], origin: BodyOrigin) -> Result<FeedDocument, FeedError> {
    FeedDocument::from_slice(body).map_err(|source| FeedError::Parse { origin, source })
}
