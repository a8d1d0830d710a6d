//! SOFA feed document model
//!
//! Only the parts of the feed used for compatibility checks are modelled;
//! everything else in the document is ignored on parse. Lists and maps
//! that are missing or `null` parse as empty.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Parsed SOFA macOS data feed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedDocument {
    #[serde(rename = "UpdateHash", default)]
    pub update_hash: Option<String>,
    #[serde(rename = "LastCheck", default)]
    pub last_check: Option<String>,
    /// Newest release first, in feed order
    #[serde(rename = "OSVersions", default, deserialize_with = "null_as_default")]
    pub os_versions: Vec<OsVersionRecord>,
    #[serde(rename = "Models", default, deserialize_with = "null_as_default")]
    pub models: HashMap<String, ModelSupportRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OsVersionRecord {
    #[serde(rename = "OSVersion")]
    pub os_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelSupportRecord {
    #[serde(rename = "MarketingName", default)]
    pub marketing_name: Option<String>,
    /// Newest supported release first
    #[serde(rename = "SupportedOS", default, deserialize_with = "null_as_default")]
    pub supported_os: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl FeedDocument {
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Newest published OS version, by feed convention the first record
    pub fn newest_published(&self) -> Option<&str> {
        self.os_versions.first().map(|v| v.os_version.as_str())
    }

    /// Exact-match model lookup
    pub fn model(&self, identifier: &str) -> Option<&ModelSupportRecord> {
        self.models.get(identifier)
    }
}

impl ModelSupportRecord {
    pub fn newest_supported(&self) -> Option<&str> {
        self.supported_os.first().map(String::as_str)
    }
}
