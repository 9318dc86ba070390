//! Azure provider implementation

use crate::arm::{ArmClient, DEFAULT_ARM_BASE, storage_account_body, virtual_machine_body};
use crate::error::{AzureError, Result as AzureResult};
use crate::token::{AzureAdClient, DEFAULT_LOGIN_BASE};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::time::Duration;
use stratus_cloud::{
    AzureCredentials, CloudError, CloudProvider, ConnectivityReport, ProvisionResult,
    ResourceSpec,
};

const DEFAULT_LOCATION: &str = "eastus";
const DEFAULT_VM_SIZE: &str = "Standard_B2s";
const DEFAULT_STORAGE_SKU: &str = "Standard_LRS";
const DEFAULT_ADMIN_USERNAME: &str = "azureuser";

/// Endpoint overrides for tests and sovereign-cloud deployments
#[derive(Debug, Clone)]
pub struct AzureEndpoints {
    pub login_base: String,
    pub arm_base: String,
}

impl Default for AzureEndpoints {
    fn default() -> Self {
        Self {
            login_base: DEFAULT_LOGIN_BASE.to_string(),
            arm_base: DEFAULT_ARM_BASE.to_string(),
        }
    }
}

/// Azure provider
pub struct AzureProvider {
    http: reqwest::Client,
    credentials: AzureCredentials,
    endpoints: AzureEndpoints,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureProvider {
    pub fn new(http: reqwest::Client, credentials: AzureCredentials) -> Self {
        Self::with_endpoints(http, credentials, AzureEndpoints::default())
    }

    pub fn with_endpoints(
        http: reqwest::Client,
        credentials: AzureCredentials,
        endpoints: AzureEndpoints,
    ) -> Self {
        Self {
            http,
            credentials,
            endpoints,
            poll_interval: Duration::from_secs(5),
            max_polls: 60,
        }
    }

    /// Shorten the LRO poll loop, used by tests
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// One token per call; nothing outlives the request
    async fn arm_client(&self) -> AzureResult<ArmClient> {
        let token = AzureAdClient::new(self.http.clone(), &self.endpoints.login_base)
            .acquire_token(&self.credentials)
            .await?;
        Ok(
            ArmClient::new(self.http.clone(), &self.endpoints.arm_base, token)
                .with_polling(self.poll_interval, self.max_polls),
        )
    }

    async fn create_vm(&self, spec: &ResourceSpec) -> AzureResult<ProvisionResult> {
        let subscription_id = self
            .credentials
            .subscription_id
            .as_deref()
            .ok_or_else(|| AzureError::MissingConfig("subscriptionId".to_string()))?;

        let name = spec.config.sanitized_name();
        let location = spec
            .config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let vm_size = spec
            .config
            .size
            .clone()
            .unwrap_or_else(|| DEFAULT_VM_SIZE.to_string());
        let resource_group = spec
            .config
            .extra_str("resourceGroup")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{name}-rg"));
        let admin_username = spec
            .config
            .extra_str("adminUsername")
            .unwrap_or(DEFAULT_ADMIN_USERNAME);
        let admin_password = spec
            .config
            .extra_str("adminPassword")
            .ok_or_else(|| AzureError::MissingConfig("adminPassword".to_string()))?;

        let arm = self.arm_client().await?;
        arm.ensure_resource_group(subscription_id, &resource_group, &location)
            .await?;

        let body = virtual_machine_body(
            &location,
            &name,
            &vm_size,
            admin_username,
            admin_password,
            spec.config.extra_str("networkInterfaceId"),
            &spec.config.tags,
        );
        let created = arm
            .create_virtual_machine(subscription_id, &resource_group, &name, &body)
            .await?;

        let resource_id = created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "/subscriptions/{subscription_id}/resourceGroups/{resource_group}\
                     /providers/Microsoft.Compute/virtualMachines/{name}"
                )
            });

        tracing::info!(vm = name, resource_group, location, "azure vm created");

        Ok(ProvisionResult::ok(
            resource_id.clone(),
            details(json!({
                "provider": "azure",
                "type": "Virtual Machine",
                "name": name,
                "id": resource_id,
                "resourceGroup": resource_group,
                "location": location,
                "vmSize": vm_size,
            })),
        ))
    }

    async fn create_storage_account(&self, spec: &ResourceSpec) -> AzureResult<ProvisionResult> {
        let subscription_id = self
            .credentials
            .subscription_id
            .as_deref()
            .ok_or_else(|| AzureError::MissingConfig("subscriptionId".to_string()))?;

        // Storage account names additionally forbid hyphens and must be
        // 3-24 characters; a name the squeeze empties falls back like
        // sanitize_name does.
        let squeezed: String = spec
            .config
            .sanitized_name()
            .chars()
            .filter(|c| *c != '-')
            .take(24)
            .collect();
        let name = if squeezed.len() < 3 {
            "storage".to_string()
        } else {
            squeezed
        };
        let location = spec
            .config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let sku = spec
            .config
            .size
            .clone()
            .unwrap_or_else(|| DEFAULT_STORAGE_SKU.to_string());
        let resource_group = spec
            .config
            .extra_str("resourceGroup")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{name}-rg"));

        let arm = self.arm_client().await?;
        arm.ensure_resource_group(subscription_id, &resource_group, &location)
            .await?;

        let body = storage_account_body(&location, &sku, &spec.config.tags);
        let created = arm
            .create_storage_account(subscription_id, &resource_group, &name, &body)
            .await?;

        let resource_id = created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "/subscriptions/{subscription_id}/resourceGroups/{resource_group}\
                     /providers/Microsoft.Storage/storageAccounts/{name}"
                )
            });

        tracing::info!(account = name, resource_group, location, "azure storage account created");

        Ok(ProvisionResult::ok(
            resource_id.clone(),
            details(json!({
                "provider": "azure",
                "type": "Storage Account",
                "accountName": name,
                "id": resource_id,
                "resourceGroup": resource_group,
                "location": location,
                "sku": sku,
            })),
        ))
    }
}

#[async_trait]
impl CloudProvider for AzureProvider {
    fn name(&self) -> &str {
        "azure"
    }

    fn display_name(&self) -> &str {
        "Microsoft Azure"
    }

    async fn check_connectivity(&self) -> stratus_cloud::Result<ConnectivityReport> {
        let arm = match self.arm_client().await {
            Ok(arm) => arm,
            Err(e) => {
                tracing::warn!(error = %e, "azure token acquisition failed");
                return Ok(ConnectivityReport::failed("azure", e.to_string()));
            }
        };

        match arm
            .probe_subscriptions(self.credentials.subscription_id.as_deref())
            .await
        {
            Ok(body) => {
                let mut info = Map::new();
                info.insert("tokenAcquired".to_string(), json!(true));
                info.insert("tenantId".to_string(), json!(self.credentials.tenant_id));
                if let Some(id) = &self.credentials.subscription_id {
                    info.insert("subscriptionId".to_string(), json!(id));
                }
                if let Some(display_name) = body.get("displayName").and_then(Value::as_str) {
                    info.insert("subscriptionName".to_string(), json!(display_name));
                }
                Ok(ConnectivityReport::ok("azure", info))
            }
            Err(e) => {
                tracing::warn!(error = %e, "azure subscription probe failed");
                Ok(ConnectivityReport::failed("azure", e.to_string()))
            }
        }
    }

    async fn provision(&self, spec: &ResourceSpec) -> stratus_cloud::Result<ProvisionResult> {
        let outcome = match spec.type_key().as_str() {
            "vm" | "virtual machine" => self.create_vm(spec).await,
            "storage account" | "storage" => self.create_storage_account(spec).await,
            _ => {
                return Err(CloudError::UnsupportedResourceType {
                    provider: "azure".to_string(),
                    resource_type: spec.resource_type.clone(),
                });
            }
        };

        Ok(outcome.unwrap_or_else(|e| ProvisionResult::failed(e.to_string())))
    }
}

fn details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
