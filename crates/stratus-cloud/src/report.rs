//! Normalized result types returned by every provider

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of a connectivity probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityReport {
    /// Provider that was probed
    pub provider: String,

    /// Whether the credentials authenticated against the live API
    pub success: bool,

    /// True when the verdict came from a genuine API round trip,
    /// false when the request never reached the provider
    pub is_real_time: bool,

    /// Provider-specific identity details on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,

    /// Human-readable error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectivityReport {
    pub fn ok(provider: impl Into<String>, details: Map<String, Value>) -> Self {
        Self {
            provider: provider.into(),
            success: true,
            is_real_time: true,
            details: Some(details),
            error: None,
        }
    }

    /// A live probe attempt that the provider rejected
    pub fn failed(provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            success: false,
            is_real_time: true,
            details: None,
            error: Some(error.into()),
        }
    }

    /// A probe rejected before any network call was made
    pub fn rejected(provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            is_real_time: false,
            ..Self::failed(provider, error)
        }
    }
}

/// Outcome of a provisioning call
///
/// Invariant: success implies a non-empty `resource_id`; failure implies a
/// non-empty `error` and no `resource_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProvisionResult {
    pub fn ok(resource_id: impl Into<String>, details: Map<String, Value>) -> Self {
        Self {
            success: true,
            resource_id: Some(resource_id.into()),
            details: Some(details),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            resource_id: None,
            details: None,
            error: Some(error.into()),
        }
    }
}
