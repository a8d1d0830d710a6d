//! Configuration management
//!
//! Handles:
//! - SOFA feed endpoint and request settings
//! - Cache location on disk
//! - Virtual machine model substitution
//! - Host command timeouts

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SOFA_AGENT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub feed: FeedConfig,
    pub cache: CacheConfig,
    pub models: ModelConfig,
    pub host: HostConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub json_file: String,
    pub etag_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Substring identifying a virtualized Mac
    pub virtual_marker: String,
    /// Physical model whose support list stands in for virtual machines
    pub reference_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub command_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "https://sofafeed.macadmins.io/v1/macos_data_feed.json".to_string(),
            user_agent: "SOFA-osquery-macOSCompatibilityCheck/1.0".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/private/var/tmp/sofa"),
            json_file: "macos_data_feed.json".to_string(),
            etag_file: "macos_data_feed_etag.txt".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            virtual_marker: "VirtualMac".to_string(),
            reference_model: "Macmini9,1".to_string(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { command_timeout_secs: 10 }
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    pub fn json_path(&self) -> PathBuf {
        self.dir.join(&self.json_file)
    }

    pub fn etag_path(&self) -> PathBuf {
        self.dir.join(&self.etag_file)
    }
}

impl HostConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl AgentConfig {
    /// Load config from the configured location, defaults if the file is absent
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(config_path).await
    }

    pub async fn load_from(config_path: PathBuf) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let config: AgentConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", config_path.display()))?;
        Ok(config)
    }

    /// Save config to the configured location
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path()?;
        self.save_to(config_path).await
    }

    pub async fn save_to(&self, config_path: PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Config file path: `$SOFA_AGENT_CONFIG`, else the OS config directory
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        path.push("sofa-agent");
        path.push("config.toml");
        Ok(path)
    }
}
