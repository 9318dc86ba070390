//! Azure Resource Manager client
//!
//! Resource creation on ARM is a long-running operation: the initial PUT
//! answers 201/202 and the caller polls the operation URL until it reaches
//! a terminal state. The poll loop here is bounded; exhausting the budget
//! is reported as a provider error naming the operation.

use crate::error::{AzureError, Result};
use crate::token::truncate;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_ARM_BASE: &str = "https://management.azure.com";

const SUBSCRIPTION_API_VERSION: &str = "2020-01-01";
const RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";
const COMPUTE_API_VERSION: &str = "2023-03-01";
const STORAGE_API_VERSION: &str = "2023-01-01";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_POLLS: u32 = 60;

/// ARM REST client scoped to one request's bearer token
pub struct ArmClient {
    http: reqwest::Client,
    arm_base: String,
    token: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ArmClient {
    pub fn new(http: reqwest::Client, arm_base: impl Into<String>, token: String) -> Self {
        Self {
            http,
            arm_base: arm_base.into(),
            token,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Shorten the poll loop, used by tests against a fake ARM endpoint
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn url(&self, path: &str, api_version: &str) -> String {
        format!(
            "{}{path}?api-version={api_version}",
            self.arm_base.trim_end_matches('/')
        )
    }

    /// Cheapest read-only probe: the subscription itself when one is named,
    /// the subscription list otherwise.
    pub async fn probe_subscriptions(&self, subscription_id: Option<&str>) -> Result<Value> {
        let path = match subscription_id {
            Some(id) => format!("/subscriptions/{id}"),
            None => "/subscriptions".to_string(),
        };
        self.get(&self.url(&path, SUBSCRIPTION_API_VERSION)).await
    }

    /// Create the resource group if it does not exist; ARM's PUT is an
    /// upsert, so no existence check is needed.
    pub async fn ensure_resource_group(
        &self,
        subscription_id: &str,
        resource_group: &str,
        location: &str,
    ) -> Result<Value> {
        let path = format!("/subscriptions/{subscription_id}/resourcegroups/{resource_group}");
        self.put_and_poll(
            &self.url(&path, RESOURCE_GROUP_API_VERSION),
            &json!({ "location": location }),
        )
        .await
    }

    pub async fn create_virtual_machine(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
        body: &Value,
    ) -> Result<Value> {
        let path = format!(
            "/subscriptions/{subscription_id}/resourceGroups/{resource_group}\
             /providers/Microsoft.Compute/virtualMachines/{name}"
        );
        self.put_and_poll(&self.url(&path, COMPUTE_API_VERSION), body)
            .await
    }

    pub async fn create_storage_account(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
        body: &Value,
    ) -> Result<Value> {
        let path = format!(
            "/subscriptions/{subscription_id}/resourceGroups/{resource_group}\
             /providers/Microsoft.Storage/storageAccounts/{name}"
        );
        self.put_and_poll(&self.url(&path, STORAGE_API_VERSION), body)
            .await
    }

    async fn get(&self, url: &str) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        read_json(response).await
    }

    /// PUT the resource and poll the `Azure-AsyncOperation`/`Location`
    /// header until the operation resolves.
    async fn put_and_poll(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let operation_url = response
            .headers()
            .get("azure-asyncoperation")
            .or_else(|| response.headers().get("location"))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let initial = read_json_with_status(response, status).await?;

        // 200 means the operation completed synchronously.
        if status.as_u16() == 200 {
            return Ok(initial);
        }

        let Some(operation_url) = operation_url else {
            // 201 without an operation header also counts as terminal.
            return Ok(initial);
        };

        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .http
                .get(&operation_url)
                .bearer_auth(&self.token)
                .send()
                .await?;
            let poll_status = response.status();

            // Location-style polling answers 202 until done.
            if poll_status.as_u16() == 202 {
                continue;
            }

            let body = read_json_with_status(response, poll_status).await?;
            match body.get("status").and_then(Value::as_str) {
                Some("Succeeded") => return Ok(initial),
                // No status field means Location-style polling handed back
                // the finished resource itself.
                None => return Ok(body),
                Some("InProgress") | Some("Running") => continue,
                Some(terminal) => {
                    let detail = body
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .unwrap_or(terminal);
                    return Err(AzureError::Api {
                        status: poll_status.as_u16(),
                        message: format!("operation {terminal}: {detail}"),
                    });
                }
            }
        }

        Err(AzureError::OperationTimeout(operation_url))
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    read_json_with_status(response, status).await
}

async fn read_json_with_status(
    response: reqwest::Response,
    status: reqwest::StatusCode,
) -> Result<Value> {
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| truncate(&body));
        return Err(AzureError::Api {
            status: status.as_u16(),
            message,
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| AzureError::MalformedResponse(e.to_string()))
}

/// Request body for a VM create-or-update
pub fn virtual_machine_body(
    location: &str,
    name: &str,
    vm_size: &str,
    admin_username: &str,
    admin_password: &str,
    network_interface_id: Option<&str>,
    tags: &HashMap<String, String>,
) -> Value {
    let mut properties = json!({
        "hardwareProfile": { "vmSize": vm_size },
        "storageProfile": {
            "imageReference": {
                "publisher": "Canonical",
                "offer": "0001-com-ubuntu-server-jammy",
                "sku": "22_04-lts-gen2",
                "version": "latest",
            },
            "osDisk": {
                "createOption": "FromImage",
                "managedDisk": { "storageAccountType": "Standard_LRS" },
            },
        },
        "osProfile": {
            "computerName": name,
            "adminUsername": admin_username,
            "adminPassword": admin_password,
        },
    });
    if let Some(nic) = network_interface_id {
        properties["networkProfile"] = json!({
            "networkInterfaces": [{ "id": nic }],
        });
    }

    json!({
        "location": location,
        "tags": tags,
        "properties": properties,
    })
}

/// Request body for a storage-account create
pub fn storage_account_body(location: &str, sku: &str, tags: &HashMap<String, String>) -> Value {
    json!({
        "location": location,
        "sku": { "name": sku },
        "kind": "StorageV2",
        "tags": tags,
    })
}
