//! GCP REST calls: Compute Engine, Cloud Storage, Resource Manager

use crate::error::{GcpError, Result};
use serde_json::{Value, json};
use std::collections::HashMap;

pub const DEFAULT_COMPUTE_BASE: &str = "https://compute.googleapis.com";
pub const DEFAULT_STORAGE_BASE: &str = "https://storage.googleapis.com";
pub const DEFAULT_CRM_BASE: &str = "https://cloudresourcemanager.googleapis.com";

const DEFAULT_BOOT_IMAGE: &str = "projects/debian-cloud/global/images/family/debian-12";

/// GCP REST client scoped to one request's bearer token
pub struct GcpApiClient {
    http: reqwest::Client,
    compute_base: String,
    storage_base: String,
    crm_base: String,
    token: String,
}

impl GcpApiClient {
    pub fn new(
        http: reqwest::Client,
        compute_base: impl Into<String>,
        storage_base: impl Into<String>,
        crm_base: impl Into<String>,
        token: String,
    ) -> Self {
        Self {
            http,
            compute_base: compute_base.into(),
            storage_base: storage_base.into(),
            crm_base: crm_base.into(),
            token,
        }
    }

    /// Read-only project fetch, the cheapest call that exercises both the
    /// token and an actual GCP API.
    pub async fn get_project(&self, project_id: &str) -> Result<Value> {
        let url = format!(
            "{}/v1/projects/{project_id}",
            self.crm_base.trim_end_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        read_json(response).await
    }

    /// `compute.instances.insert`
    pub async fn insert_instance(
        &self,
        project_id: &str,
        zone: &str,
        body: &Value,
    ) -> Result<Value> {
        let url = format!(
            "{}/compute/v1/projects/{project_id}/zones/{zone}/instances",
            self.compute_base.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// `storage.buckets.insert`
    pub async fn insert_bucket(&self, project_id: &str, body: &Value) -> Result<Value> {
        let url = format!(
            "{}/storage/v1/b?project={project_id}",
            self.storage_base.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());
        return Err(GcpError::Api {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_str(&body).map_err(|e| GcpError::MalformedResponse(e.to_string()))
}

/// Request body for `instances.insert`
pub fn instance_body(
    name: &str,
    zone: &str,
    machine_type: &str,
    labels: &HashMap<String, String>,
) -> Value {
    json!({
        "name": name,
        "machineType": format!("zones/{zone}/machineTypes/{machine_type}"),
        "disks": [{
            "boot": true,
            "autoDelete": true,
            "initializeParams": { "sourceImage": DEFAULT_BOOT_IMAGE },
        }],
        "networkInterfaces": [{ "network": "global/networks/default" }],
        "labels": labels,
    })
}

/// Request body for `buckets.insert`
pub fn bucket_body(name: &str, location: &str, labels: &HashMap<String, String>) -> Value {
    json!({
        "name": name,
        "location": location,
        "labels": labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_body_shape() {
        let labels = HashMap::from([("team".to_string(), "data".to_string())]);
        let body = instance_body("worker-1", "us-central1-a", "e2-medium", &labels);

        assert_eq!(body["name"], "worker-1");
        assert_eq!(
            body["machineType"],
            "zones/us-central1-a/machineTypes/e2-medium"
        );
        assert_eq!(body["disks"][0]["boot"], true);
        assert_eq!(body["labels"]["team"], "data");
    }

    #[test]
    fn test_bucket_body_shape() {
        let body = bucket_body("artifacts", "US", &HashMap::new());
        assert_eq!(body["name"], "artifacts");
        assert_eq!(body["location"], "US");
    }
}
