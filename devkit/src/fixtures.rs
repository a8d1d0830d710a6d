/*!
Feed fixtures

Builds SOFA-shaped feed documents for tests without hand-writing JSON.
*/

use serde_json::{json, Map, Value};

/// Builder for a SOFA macOS data feed
#[derive(Debug, Clone, Default)]
pub struct FeedBuilder {
    os_versions: Vec<String>,
    models: Map<String, Value>,
    update_hash: Option<String>,
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a release; the first one added is the newest
    pub fn os_version<S: Into<String>>(mut self, version: S) -> Self {
        self.os_versions.push(version.into());
        self
    }

    /// Add a model with its supported releases, newest first
    pub fn model<S: Into<String>>(mut self, identifier: S, supported_os: &[&str]) -> Self {
        self.models
            .insert(identifier.into(), json!({ "SupportedOS": supported_os }));
        self
    }

    pub fn marketed_model<S: Into<String>>(
        mut self,
        identifier: S,
        marketing_name: &str,
        supported_os: &[&str],
    ) -> Self {
        self.models.insert(
            identifier.into(),
            json!({ "MarketingName": marketing_name, "SupportedOS": supported_os }),
        );
        self
    }

    pub fn update_hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.update_hash = Some(hash.into());
        self
    }

    pub fn build(&self) -> Value {
        let os_versions: Vec<Value> = self
            .os_versions
            .iter()
            .map(|v| json!({ "OSVersion": v, "SecurityReleases": [] }))
            .collect();

        let mut feed = json!({
            "OSVersions": os_versions,
            "Models": Value::Object(self.models.clone()),
        });
        if let Some(hash) = &self.update_hash {
            feed["UpdateHash"] = json!(hash);
        }
        feed
    }

    pub fn to_json(&self) -> String {
        self.build().to_string()
    }

    /// The current-generation feed used across the agent tests
    pub fn sequoia() -> Self {
        Self::new()
            .update_hash("3c1f0b")
            .os_version("15.1")
            .os_version("14.7.1")
            .os_version("13.7.1")
            .marketed_model("Macmini9,1", "Mac mini (M1, 2020)", &["15.1", "14.7.1", "13.7.1"])
            .marketed_model("Mac14,2", "MacBook Air (M2, 2022)", &["15.1", "14.7.1"])
            .marketed_model("MacBookPro14,1", "MacBook Pro (13-inch, 2017)", &["13.7.1"])
            .model("MacBookPro11,1", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_order() {
        let feed = FeedBuilder::new().os_version("15.1").os_version("14.7").build();
        assert_eq!(feed["OSVersions"][0]["OSVersion"], "15.1");
        assert_eq!(feed["OSVersions"][1]["OSVersion"], "14.7");
    }

    #[test]
    fn test_models_and_hash() {
        let feed = FeedBuilder::sequoia().build();
        assert_eq!(feed["UpdateHash"], "3c1f0b");
        assert_eq!(feed["Models"]["Mac14,2"]["SupportedOS"][0], "15.1");
        assert_eq!(feed["Models"]["MacBookPro11,1"]["SupportedOS"], json!([]));
    }

    #[test]
    fn test_empty_feed() {
        let feed: Value = serde_json::from_str(&FeedBuilder::new().to_json()).unwrap();
        assert_eq!(feed["OSVersions"], json!([]));
        assert_eq!(feed["Models"], json!({}));
    }
}
