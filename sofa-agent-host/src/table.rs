//! `macos_compatibility` table: one row per query
//!
//! Runs host facts → feed fetch → resolution and turns any failure along the
//! way into a degraded row. A query always yields exactly one row.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::config::AgentConfig;
use crate::fetcher::FeedFetcher;
use crate::host::{HostFactSource, HostFacts};
use crate::resolver::{
    os_major, Compatibility, CompatibilityResolver, CompatibilityVerdict, Status, UNKNOWN,
};

pub const TABLE_NAME: &str = "macos_compatibility";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
}

pub const COLUMNS: &[Column] = &[
    Column { name: "system_version", column_type: ColumnType::Text },
    Column { name: "system_os_major", column_type: ColumnType::Text },
    Column { name: "model_identifier", column_type: ColumnType::Text },
    Column { name: "latest_macos", column_type: ColumnType::Text },
    Column { name: "latest_compatible_macos", column_type: ColumnType::Text },
    Column { name: "is_compatible", column_type: ColumnType::Integer },
    Column { name: "status", column_type: ColumnType::Text },
];

/// Output row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityRow {
    pub system_version: String,
    pub system_os_major: String,
    pub model_identifier: String,
    pub latest_macos: String,
    pub latest_compatible_macos: String,
    pub is_compatible: i32,
    pub status: String,
}

impl From<CompatibilityVerdict> for CompatibilityRow {
    fn from(verdict: CompatibilityVerdict) -> Self {
        Self {
            system_version: verdict.system_version,
            system_os_major: verdict.system_os_major,
            model_identifier: verdict.model_identifier,
            latest_macos: verdict.latest_macos,
            latest_compatible_macos: verdict.latest_compatible_macos,
            is_compatible: verdict.compatibility.as_i32(),
            status: verdict.status.to_string(),
        }
    }
}

impl CompatibilityRow {
    /// Column name → text value, as handed to a table plugin
    pub fn to_columns(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("system_version", self.system_version.clone()),
            ("system_os_major", self.system_os_major.clone()),
            ("model_identifier", self.model_identifier.clone()),
            ("latest_macos", self.latest_macos.clone()),
            ("latest_compatible_macos", self.latest_compatible_macos.clone()),
            ("is_compatible", self.is_compatible.to_string()),
            ("status", self.status.clone()),
        ])
    }
}

fn degraded(
    system_version: &str,
    system_os_major: &str,
    model_identifier: &str,
    status: String,
) -> CompatibilityRow {
    CompatibilityVerdict {
        system_version: system_version.to_string(),
        system_os_major: system_os_major.to_string(),
        model_identifier: model_identifier.to_string(),
        latest_macos: UNKNOWN.to_string(),
        latest_compatible_macos: UNKNOWN.to_string(),
        compatibility: Compatibility::Indeterminate,
        status: Status::Error(status),
    }
    .into()
}

/// Build the single row for one query
pub async fn generate<S: HostFactSource>(config: &AgentConfig, host: &S) -> CompatibilityRow {
    let facts = match HostFacts::collect(host).await {
        Ok(facts) => facts,
        Err(e) => {
            error!("Error getting system info: {}", e);
            return degraded(UNKNOWN, UNKNOWN, UNKNOWN, format!("Error getting system info: {}", e));
        }
    };
    let system_os_major = os_major(&facts.system_version);

    let fetched = match FeedFetcher::new(&config.feed, &config.cache) {
        Ok(fetcher) => fetcher.fetch().await,
        Err(e) => Err(e),
    };

    let doc = match fetched {
        Ok(doc) => doc,
        Err(e) => {
            error!("Could not obtain data: {}", e);
            return degraded(
                &facts.system_version,
                system_os_major,
                &facts.model_identifier,
                format!("Could not obtain data: {}", e),
            );
        }
    };

    let verdict = CompatibilityResolver::new(&config.models).resolve(
        &doc,
        &facts.system_version,
        &facts.model_identifier,
    );
    let marketing_name = doc
        .model(&verdict.model_identifier)
        .and_then(|model| model.marketing_name.as_deref())
        .unwrap_or("unknown model");
    info!(
        "Compatibility for {} ({}) on macOS {}: {} (latest {}, model supports {})",
        verdict.model_identifier,
        marketing_name,
        verdict.system_version,
        verdict.status,
        verdict.latest_macos,
        verdict.latest_compatible_macos
    );

    verdict.into()
}
