//! SOFA Agent Host - macOS compatibility checks against the SOFA feed
//!
//! Answers one question per run: is this Mac on the newest macOS its
//! hardware supports?
//! - Conditional fetch of the SOFA feed (ETag / 304) with an on-disk cache
//! - Stale-cache fallback when the network or the feed endpoint fails
//! - Always exactly one result row, degraded rather than failing

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod host;
pub mod resolver;
pub mod table;

pub use config::AgentConfig;
pub use feed::FeedDocument;
pub use fetcher::{FeedFetcher, FeedSource};
pub use resolver::{Compatibility, CompatibilityResolver, CompatibilityVerdict, Status};
pub use table::{generate, CompatibilityRow};
