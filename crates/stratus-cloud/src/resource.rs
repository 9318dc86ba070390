//! Resource specification shared by all providers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single resource to provision: the requested type plus its configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Requested resource type, matched case-insensitively by each provider
    /// (e.g. "EC2 Instance", "storage account", "cloud storage")
    pub resource_type: String,

    /// Resource configuration from the request body
    pub config: ResourceConfig,
}

impl ResourceSpec {
    pub fn new(resource_type: impl Into<String>, config: ResourceConfig) -> Self {
        Self {
            resource_type: resource_type.into(),
            config,
        }
    }

    /// Resource type normalized for dispatch
    pub fn type_key(&self) -> String {
        self.resource_type.trim().to_lowercase()
    }
}

/// Configuration for a cloud resource
///
/// Only `name` is required. Provider- or type-specific fields (engine,
/// masterUsername, zone, resourceGroup, ...) land in `extra` and are read
/// by the adapter that understands them; the rest are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Instance size / machine type / VM size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Storage allocation in GB where the resource type has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<u32>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ResourceConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Provider-specific string field from the passthrough map
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    /// Name lower-cased and stripped to `[a-z0-9-]`, as submitted to the
    /// provider API
    pub fn sanitized_name(&self) -> String {
        sanitize_name(&self.name)
    }
}

/// Sanitize a resource name for submission: provider naming rules differ,
/// so everything outside lowercase alphanumerics and hyphens is dropped.
/// Never returns an empty string.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    if sanitized.is_empty() {
        "resource".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn is_sanitized(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("My Web Server"), "mywebserver");
        assert_eq!(sanitize_name("prod-db-01"), "prod-db-01");
        assert_eq!(sanitize_name("Data_Lake (v2)"), "datalakev2");
        assert_eq!(sanitize_name("日本語"), "resource");
        assert_eq!(sanitize_name(""), "resource");
    }

    #[test]
    fn test_sanitize_name_always_matches_charset() {
        for name in [
            "UPPER CASE",
            "sym!bo@ls#",
            "  spaces  ",
            "mixed-OK-123",
            "---",
            "_",
        ] {
            assert!(is_sanitized(&sanitize_name(name)), "failed for {name:?}");
        }
    }

    #[test]
    fn test_config_extra_passthrough() {
        let config: ResourceConfig = serde_json::from_value(json!({
            "name": "app-db",
            "storageSize": 50,
            "engine": "postgres",
            "masterUsername": "admin",
            "tags": { "env": "prod" },
        }))
        .unwrap();

        assert_eq!(config.name, "app-db");
        assert_eq!(config.storage_size, Some(50));
        assert_eq!(config.extra_str("engine"), Some("postgres"));
        assert_eq!(config.extra_str("masterUsername"), Some("admin"));
        assert_eq!(config.tags.get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_type_key_normalizes() {
        let spec = ResourceSpec::new("  EC2 Instance ", ResourceConfig::named("x"));
        assert_eq!(spec.type_key(), "ec2 instance");
    }
}
