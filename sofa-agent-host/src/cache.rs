//! On-disk cache for the feed body and its ETag
//!
//! Two files in one directory: the raw feed body exactly as received, and
//! the validation token that identifies it. Reads never fail: a missing or
//! unreadable artifact is simply absent.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::CacheError;

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

pub struct CacheStore {
    dir: PathBuf,
    body_path: PathBuf,
    token_path: PathBuf,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            body_path: config.json_path(),
            token_path: config.etag_path(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if needed
    pub async fn ensure_directory(&self) -> Result<(), CacheError> {
        if tokio::fs::metadata(&self.dir).await.is_ok_and(|m| m.is_dir()) {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CacheError::Directory { path: self.dir.clone(), source })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(DIR_MODE))
                .await
                .map_err(|source| CacheError::Directory { path: self.dir.clone(), source })?;
        }

        debug!("Created cache directory {}", self.dir.display());
        Ok(())
    }

    /// Cached feed body, `None` when missing, empty or unreadable
    pub async fn load_body(&self) -> Option<Vec<u8>> {
        match tokio::fs::read(&self.body_path).await {
            Ok(body) if !body.is_empty() => Some(body),
            Ok(_) => None,
            Err(e) => {
                debug!("No cached body at {}: {}", self.body_path.display(), e);
                None
            }
        }
    }

    /// Cached validation token, trimmed
    pub async fn load_token(&self) -> Option<String> {
        let raw = tokio::fs::read_to_string(&self.token_path).await.ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    pub async fn store_body(&self, body: &[u8]) -> Result<(), CacheError> {
        write_file(&self.body_path, body).await
    }

    /// Only call after a successful `store_body`
    pub async fn store_token(&self, token: &str) -> Result<(), CacheError> {
        write_file(&self.token_path, token.as_bytes()).await
    }

    pub async fn clear_token(&self) -> Result<(), CacheError> {
        match tokio::fs::remove_file(&self.token_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Remove { path: self.token_path.clone(), source }),
        }
    }

    /// Last modification time of the cached body
    pub async fn body_modified(&self) -> Option<DateTime<Utc>> {
        let modified = tokio::fs::metadata(&self.body_path).await.ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), CacheError> {
    let to_error = |source: std::io::Error| CacheError::Write { path: path.to_path_buf(), source };

    tokio::fs::write(path, contents).await.map_err(to_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(FILE_MODE))
            .await
            .map_err(to_error)?;
    }

    Ok(())
}
