//! Compatibility resolution
//!
//! Pure decision table over (feed has versions, model is known, newest
//! versions match). Never fails: missing data shows up in the verdict.

use serde::Serialize;
use std::fmt;

use crate::config::ModelConfig;
use crate::feed::FeedDocument;

pub const UNKNOWN: &str = "Unknown";
pub const UNSUPPORTED: &str = "Unsupported";
pub const NO_OS_VERSIONS: &str = "No OS versions in feed data";

/// Tri-state compatibility flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    Compatible,
    NotCompatible,
    Indeterminate,
}

impl Compatibility {
    /// Integer column value: 1, 0 or -1
    pub fn as_i32(self) -> i32 {
        match self {
            Compatibility::Compatible => 1,
            Compatibility::NotCompatible => 0,
            Compatibility::Indeterminate => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Status {
    Pass,
    Fail,
    UnsupportedHardware,
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => f.write_str("Pass"),
            Status::Fail => f.write_str("Fail"),
            Status::UnsupportedHardware => f.write_str("UnsupportedHardware"),
            Status::Error(message) => f.write_str(message),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityVerdict {
    pub system_version: String,
    pub system_os_major: String,
    pub model_identifier: String,
    pub latest_macos: String,
    pub latest_compatible_macos: String,
    pub compatibility: Compatibility,
    pub status: Status,
}

/// First dot-separated segment of a version string
pub fn os_major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

pub struct CompatibilityResolver {
    virtual_marker: String,
    reference_model: String,
}

impl Default for CompatibilityResolver {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}

impl CompatibilityResolver {
    pub fn new(models: &ModelConfig) -> Self {
        Self {
            virtual_marker: models.virtual_marker.clone(),
            reference_model: models.reference_model.clone(),
        }
    }

    /// Virtual machines are looked up as the reference physical model
    pub fn substitute_model<'a>(&'a self, hardware_model: &'a str) -> &'a str {
        if !self.virtual_marker.is_empty() && hardware_model.contains(&self.virtual_marker) {
            &self.reference_model
        } else {
            hardware_model
        }
    }

    pub fn resolve(
        &self,
        doc: &FeedDocument,
        installed_version: &str,
        hardware_model: &str,
    ) -> CompatibilityVerdict {
        let system_version = installed_version.to_string();
        let system_os_major = os_major(installed_version).to_string();

        let Some(newest_published) = doc.newest_published() else {
            return CompatibilityVerdict {
                system_version,
                system_os_major,
                model_identifier: hardware_model.to_string(),
                latest_macos: UNKNOWN.to_string(),
                latest_compatible_macos: UNKNOWN.to_string(),
                compatibility: Compatibility::Indeterminate,
                status: Status::Error(NO_OS_VERSIONS.to_string()),
            };
        };

        let model_identifier = self.substitute_model(hardware_model);

        let (newest_supported, mut status) = match doc
            .model(model_identifier)
            .and_then(|model| model.newest_supported())
        {
            Some(version) => (version, Status::Pass),
            None => (UNSUPPORTED, Status::UnsupportedHardware),
        };

        let compatibility = if newest_published == newest_supported {
            Compatibility::Compatible
        } else {
            Compatibility::NotCompatible
        };

        if compatibility == Compatibility::NotCompatible && status == Status::Pass {
            status = Status::Fail;
        }

        CompatibilityVerdict {
            system_version,
            system_os_major,
            model_identifier: model_identifier.to_string(),
            latest_macos: newest_published.to_string(),
            latest_compatible_macos: newest_supported.to_string(),
            compatibility,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{ModelSupportRecord, OsVersionRecord};

    fn feed(os_versions: &[&str], models: &[(&str, &[&str])]) -> FeedDocument {
        FeedDocument {
            os_versions: os_versions
                .iter()
                .map(|v| OsVersionRecord { os_version: v.to_string() })
                .collect(),
            models: models
                .iter()
                .map(|(id, supported)| {
                    (
                        id.to_string(),
                        ModelSupportRecord {
                            marketing_name: None,
                            supported_os: supported.iter().map(|s| s.to_string()).collect(),
                        },
                    )
                })
                .collect(),
            ..FeedDocument::default()
        }
    }

    #[test]
    fn test_newest_supported_matches_published() {
        let doc = feed(&["15.1"], &[("Mac14,2", &["15.1", "14.7"])]);
        let verdict = CompatibilityResolver::default().resolve(&doc, "15.0.1", "Mac14,2");

        assert_eq!(verdict.compatibility, Compatibility::Compatible);
        assert_eq!(verdict.status, Status::Pass);
        assert_eq!(verdict.system_os_major, "15");
        assert_eq!(verdict.latest_macos, "15.1");
        assert_eq!(verdict.latest_compatible_macos, "15.1");
    }

    #[test]
    fn test_older_model_fails() {
        let doc = feed(&["15.1"], &[("MacBookPro14,1", &["14.7"])]);
        let verdict = CompatibilityResolver::default().resolve(&doc, "14.7", "MacBookPro14,1");

        assert_eq!(verdict.compatibility.as_i32(), 0);
        assert_eq!(verdict.status, Status::Fail);
        assert_eq!(verdict.latest_compatible_macos, "14.7");
    }

    #[test]
    fn test_unknown_model_is_unsupported_hardware() {
        let doc = feed(&["15.1"], &[("Mac14,2", &["15.1"])]);
        let verdict = CompatibilityResolver::default().resolve(&doc, "12.7", "iMac12,1");

        assert_eq!(verdict.compatibility.as_i32(), 0);
        assert_eq!(verdict.status, Status::UnsupportedHardware);
        assert_eq!(verdict.status.to_string(), "UnsupportedHardware");
        assert_eq!(verdict.latest_compatible_macos, "Unsupported");
    }

    #[test]
    fn test_empty_support_list_is_unsupported_hardware() {
        let doc = feed(&["15.1"], &[("iMac12,1", &[])]);
        let verdict = CompatibilityResolver::default().resolve(&doc, "10.13.6", "iMac12,1");

        assert_eq!(verdict.status, Status::UnsupportedHardware);
        assert_eq!(verdict.latest_compatible_macos, UNSUPPORTED);
    }

    #[test]
    fn test_null_models_is_unsupported_hardware() {
        let doc =
            FeedDocument::from_slice(br#"{"OSVersions": [{"OSVersion": "15.1"}], "Models": null}"#)
                .unwrap();
        let verdict = CompatibilityResolver::default().resolve(&doc, "15.1", "Mac14,2");

        assert_eq!(verdict.compatibility.as_i32(), 0);
        assert_eq!(verdict.status, Status::UnsupportedHardware);
        assert_eq!(verdict.latest_compatible_macos, UNSUPPORTED);
    }

    #[test]
    fn test_empty_feed_is_indeterminate() {
        let doc = feed(&[], &[("Mac14,2", &["15.1"])]);
        let verdict = CompatibilityResolver::default().resolve(&doc, "15.1", "Mac14,2");

        assert_eq!(verdict.compatibility.as_i32(), -1);
        assert_eq!(verdict.latest_macos, UNKNOWN);
        assert_eq!(verdict.latest_compatible_macos, UNKNOWN);
        assert_eq!(verdict.status.to_string(), NO_OS_VERSIONS);
    }

    #[test]
    fn test_non_empty_feed_never_reports_missing_versions() {
        let resolver = CompatibilityResolver::default();
        let cases: &[(&[&str], &str)] = &[
            (&["15.1"], "Mac14,2"),
            (&["15.1", "14.7"], "Unknown1,1"),
            (&[""], ""),
            (&["Sequoia 15"], "VirtualMac2,1"),
        ];

        for (versions, model) in cases {
            let doc = feed(versions, &[("Mac14,2", &["15.1"]), ("Macmini9,1", &[])]);
            let verdict = resolver.resolve(&doc, "15.1", model);
            assert_ne!(verdict.status.to_string(), NO_OS_VERSIONS);
            assert_ne!(verdict.compatibility, Compatibility::Indeterminate);
        }
    }

    #[test]
    fn test_virtual_machine_uses_reference_model() {
        let doc = feed(&["15.1"], &[("Macmini9,1", &["15.1", "14.7"])]);
        let verdict = CompatibilityResolver::default().resolve(&doc, "15.1", "VirtualMac2,1");

        assert_eq!(verdict.model_identifier, "Macmini9,1");
        assert_eq!(verdict.compatibility, Compatibility::Compatible);
        assert_eq!(verdict.status, Status::Pass);
    }

    #[test]
    fn test_custom_reference_model() {
        let resolver = CompatibilityResolver::new(&ModelConfig {
            virtual_marker: "VirtualMac".to_string(),
            reference_model: "Mac14,3".to_string(),
        });
        assert_eq!(resolver.substitute_model("VirtualMac2,1"), "Mac14,3");
        assert_eq!(resolver.substitute_model("Mac14,2"), "Mac14,2");
    }

    #[test]
    fn test_version_comparison_is_exact() {
        let doc = feed(&["15.1"], &[("Mac14,2", &["15.1.0"])]);
        let verdict = CompatibilityResolver::default().resolve(&doc, "15.1", "Mac14,2");

        assert_eq!(verdict.compatibility, Compatibility::NotCompatible);
        assert_eq!(verdict.status, Status::Fail);
    }

    #[test]
    fn test_os_major() {
        assert_eq!(os_major("14.5"), "14");
        assert_eq!(os_major("15"), "15");
        assert_eq!(os_major("10.15.7"), "10");
        assert_eq!(os_major(""), "");
    }
}
