//! Error types for host facts, cache and feed retrieval

use std::path::PathBuf;
use std::time::Duration;

/// Where an unparseable feed body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOrigin {
    Network,
    Cache,
}

impl std::fmt::Display for BodyOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodyOrigin::Network => f.write_str("fetched"),
            BodyOrigin::Cache => f.write_str("cached"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostFactError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("{command} exited with status {code:?}")]
    ExitStatus { command: String, code: Option<i32> },
    #[error("{command} returned no output")]
    EmptyOutput { command: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to create cache directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    CacheDirectory(CacheError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("server reported feed unchanged but no cached data is available")]
    CacheInconsistent,
    #[error("failed to parse {origin} feed data: {source}")]
    Parse {
        origin: BodyOrigin,
        #[source]
        source: serde_json::Error,
    },
    #[error("{reason} and no cache available")]
    Unavailable { reason: String },
}
