/*!
Test harness for the agent

Pairs a stub feed server with a throwaway cache directory and offers
helpers to seed and inspect the two cache artifacts.
*/

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::feed_stub::FeedStub;

pub const JSON_FILE: &str = "macos_data_feed.json";
pub const ETAG_FILE: &str = "macos_data_feed_etag.txt";

pub struct TestHarness {
    pub stub: FeedStub,
    temp: TempDir,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        init_tracing();
        Ok(Self {
            stub: FeedStub::start().await,
            temp: tempfile::tempdir()?,
        })
    }

    pub fn feed_url(&self) -> String {
        self.stub.url()
    }

    /// Cache directory; not created until the agent or a seed helper does
    pub fn cache_dir(&self) -> PathBuf {
        self.temp.path().join("sofa")
    }

    pub fn json_cache_path(&self) -> PathBuf {
        self.cache_dir().join(JSON_FILE)
    }

    pub fn etag_cache_path(&self) -> PathBuf {
        self.cache_dir().join(ETAG_FILE)
    }

    /// Scratch space outside the cache directory
    pub fn scratch(&self) -> &Path {
        self.temp.path()
    }

    pub fn seed_cache(&self, body: &str, etag: Option<&str>) -> Result<()> {
        std::fs::create_dir_all(self.cache_dir())?;
        std::fs::write(self.json_cache_path(), body)?;
        match etag {
            Some(etag) => std::fs::write(self.etag_cache_path(), etag)?,
            None => {
                if self.etag_cache_path().exists() {
                    std::fs::remove_file(self.etag_cache_path())?;
                }
            }
        }
        tracing::info!("🗄️ Seeded cache (etag: {:?})", etag);
        Ok(())
    }

    pub fn cached_body(&self) -> Option<String> {
        std::fs::read_to_string(self.json_cache_path()).ok()
    }

    pub fn cached_etag(&self) -> Option<String> {
        std::fs::read_to_string(self.etag_cache_path()).ok()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_and_read_cache() {
        let harness = TestHarness::new().await.unwrap();
        assert!(harness.cached_body().is_none());
        assert!(!harness.cache_dir().exists());

        harness.seed_cache("{}", Some("\"v1\"")).unwrap();
        assert_eq!(harness.cached_body().unwrap(), "{}");
        assert_eq!(harness.cached_etag().unwrap(), "\"v1\"");

        harness.seed_cache("[]", None).unwrap();
        assert_eq!(harness.cached_body().unwrap(), "[]");
        assert!(harness.cached_etag().is_none());
    }

    #[tokio::test]
    async fn test_feed_url_points_at_stub() {
        let harness = TestHarness::new().await.unwrap();
        assert!(harness.feed_url().starts_with("http://127.0.0.1:"));
        assert!(harness.feed_url().ends_with(crate::feed_stub::FEED_PATH));
    }
}
