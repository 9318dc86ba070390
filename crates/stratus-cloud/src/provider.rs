//! Cloud provider trait definition

use crate::error::Result;
use crate::report::{ConnectivityReport, ProvisionResult};
use crate::resource::ResourceSpec;
use async_trait::async_trait;

/// Cloud provider abstraction trait
///
/// All cloud providers (AWS, Azure, GCP) implement this trait to expose a
/// unified interface for connectivity probing and resource provisioning.
/// Implementations are constructed from a validated credential bundle and
/// re-authenticate on every call; no token survives past one invocation.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws", "azure", "gcp")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Prove that the credentials authenticate against the provider's real
    /// API using the cheapest read-only call available.
    ///
    /// Provider-level failures (bad secret, network error, non-2xx) are
    /// reported inside the [`ConnectivityReport`]; `Err` is reserved for
    /// conditions the caller rejects before dispatch.
    async fn check_connectivity(&self) -> Result<ConnectivityReport>;

    /// Create exactly one cloud resource and normalize the provider response.
    ///
    /// Unknown resource types fail with
    /// [`CloudError::UnsupportedResourceType`] before any network call;
    /// API-level failures come back as a failed [`ProvisionResult`] carrying
    /// the provider's own error text.
    ///
    /// [`CloudError::UnsupportedResourceType`]: crate::CloudError::UnsupportedResourceType
    async fn provision(&self, spec: &ResourceSpec) -> Result<ProvisionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CloudError;
    use crate::resource::ResourceConfig;
    use serde_json::Map;

    struct StaticProvider;

    #[async_trait]
    impl CloudProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        fn display_name(&self) -> &str {
            "Static Test Cloud"
        }

        async fn check_connectivity(&self) -> Result<ConnectivityReport> {
            Ok(ConnectivityReport::ok("static", Map::new()))
        }

        async fn provision(&self, spec: &ResourceSpec) -> Result<ProvisionResult> {
            match spec.type_key().as_str() {
                "widget" => Ok(ProvisionResult::ok("widget-1", Map::new())),
                _ => Err(CloudError::UnsupportedResourceType {
                    provider: "static".to_string(),
                    resource_type: spec.resource_type.clone(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let provider: Box<dyn CloudProvider> = Box::new(StaticProvider);
        assert_eq!(provider.name(), "static");

        let spec = ResourceSpec::new("Widget", ResourceConfig::named("w"));
        let result = provider.provision(&spec).await.unwrap();
        assert!(result.success);

        let spec = ResourceSpec::new("Gadget", ResourceConfig::named("g"));
        let err = provider.provision(&spec).await.unwrap_err();
        assert!(matches!(err, CloudError::UnsupportedResourceType { .. }));
    }
}
