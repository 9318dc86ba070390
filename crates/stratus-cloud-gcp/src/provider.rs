//! GCP provider implementation

use crate::error::Result as GcpResult;
use crate::resources::{
    DEFAULT_COMPUTE_BASE, DEFAULT_CRM_BASE, DEFAULT_STORAGE_BASE, GcpApiClient, bucket_body,
    instance_body,
};
use crate::token::{DEFAULT_TOKEN_URL, GcpTokenClient};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use stratus_cloud::{
    CloudError, CloudProvider, ConnectivityReport, GcpCredentials, ProvisionResult, ResourceSpec,
};

const DEFAULT_REGION: &str = "us-central1";
const DEFAULT_MACHINE_TYPE: &str = "e2-medium";
const DEFAULT_BUCKET_LOCATION: &str = "US";

/// Endpoint overrides for tests and emulators
#[derive(Debug, Clone)]
pub struct GcpEndpoints {
    pub token_url: String,
    pub compute_base: String,
    pub storage_base: String,
    pub crm_base: String,
}

impl Default for GcpEndpoints {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            compute_base: DEFAULT_COMPUTE_BASE.to_string(),
            storage_base: DEFAULT_STORAGE_BASE.to_string(),
            crm_base: DEFAULT_CRM_BASE.to_string(),
        }
    }
}

/// GCP provider
pub struct GcpProvider {
    http: reqwest::Client,
    credentials: GcpCredentials,
    endpoints: GcpEndpoints,
}

impl GcpProvider {
    pub fn new(http: reqwest::Client, credentials: GcpCredentials) -> Self {
        Self::with_endpoints(http, credentials, GcpEndpoints::default())
    }

    pub fn with_endpoints(
        http: reqwest::Client,
        credentials: GcpCredentials,
        endpoints: GcpEndpoints,
    ) -> Self {
        Self {
            http,
            credentials,
            endpoints,
        }
    }

    async fn api_client(&self) -> GcpResult<GcpApiClient> {
        let token = GcpTokenClient::new(self.http.clone(), &self.endpoints.token_url)
            .acquire_token(&self.credentials.key)
            .await?;
        Ok(GcpApiClient::new(
            self.http.clone(),
            &self.endpoints.compute_base,
            &self.endpoints.storage_base,
            &self.endpoints.crm_base,
            token,
        ))
    }

    async fn insert_instance(&self, spec: &ResourceSpec) -> GcpResult<ProvisionResult> {
        let project = &self.credentials.key.project_id;
        let name = spec.config.sanitized_name();
        let machine_type = spec
            .config
            .size
            .clone()
            .unwrap_or_else(|| DEFAULT_MACHINE_TYPE.to_string());
        let zone = spec
            .config
            .extra_str("zone")
            .map(str::to_string)
            .unwrap_or_else(|| {
                let region = spec.config.region.as_deref().unwrap_or(DEFAULT_REGION);
                format!("{region}-a")
            });

        let api = self.api_client().await?;
        let body = instance_body(&name, &zone, &machine_type, &spec.config.tags);
        let operation = api.insert_instance(project, &zone, &body).await?;

        // insert answers with an Operation; the instance name is the stable
        // identifier this layer hands back.
        let target = operation
            .get("targetLink")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        tracing::info!(instance = name, zone, machine_type, "gcp instance inserted");

        Ok(ProvisionResult::ok(
            name.clone(),
            details(json!({
                "provider": "gcp",
                "type": "Compute Engine Instance",
                "name": name,
                "zone": zone,
                "machineType": machine_type,
                "project": project,
                "targetLink": target,
            })),
        ))
    }

    async fn insert_bucket(&self, spec: &ResourceSpec) -> GcpResult<ProvisionResult> {
        let project = &self.credentials.key.project_id;
        let name = spec.config.sanitized_name();
        let location = spec
            .config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_BUCKET_LOCATION.to_string());

        let api = self.api_client().await?;
        let body = bucket_body(&name, &location, &spec.config.tags);
        let created = api.insert_bucket(project, &body).await?;

        let resource_id = created
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&name)
            .to_string();

        tracing::info!(bucket = resource_id, location, "gcp bucket created");

        Ok(ProvisionResult::ok(
            resource_id.clone(),
            details(json!({
                "provider": "gcp",
                "type": "Cloud Storage Bucket",
                "name": resource_id,
                "location": location,
                "project": project,
                "selfLink": created.get("selfLink").and_then(Value::as_str).unwrap_or_default(),
            })),
        ))
    }
}

#[async_trait]
impl CloudProvider for GcpProvider {
    fn name(&self) -> &str {
        "gcp"
    }

    fn display_name(&self) -> &str {
        "Google Cloud Platform"
    }

    async fn check_connectivity(&self) -> stratus_cloud::Result<ConnectivityReport> {
        let api = match self.api_client().await {
            Ok(api) => api,
            Err(e) => {
                tracing::warn!(error = %e, "gcp token acquisition failed");
                return Ok(ConnectivityReport::failed("gcp", e.to_string()));
            }
        };

        let project_id = &self.credentials.key.project_id;
        match api.get_project(project_id).await {
            Ok(project) => {
                let mut info = Map::new();
                info.insert("tokenAcquired".to_string(), json!(true));
                info.insert("projectId".to_string(), json!(project_id));
                if let Some(number) = project.get("projectNumber").and_then(Value::as_str) {
                    info.insert("projectNumber".to_string(), json!(number));
                }
                if let Some(state) = project.get("lifecycleState").and_then(Value::as_str) {
                    info.insert("lifecycleState".to_string(), json!(state));
                }
                Ok(ConnectivityReport::ok("gcp", info))
            }
            Err(e) => {
                // The token was good; the project read was not. Keep that
                // distinction visible to the operator.
                tracing::warn!(error = %e, "gcp project probe failed");
                let mut report = ConnectivityReport::failed("gcp", e.to_string());
                let mut info = Map::new();
                info.insert("tokenAcquired".to_string(), json!(true));
                report.details = Some(info);
                Ok(report)
            }
        }
    }

    async fn provision(&self, spec: &ResourceSpec) -> stratus_cloud::Result<ProvisionResult> {
        let outcome = match spec.type_key().as_str() {
            "vm" | "vm instance" | "compute engine" | "compute" => {
                self.insert_instance(spec).await
            }
            "cloud storage" | "storage bucket" | "bucket" => self.insert_bucket(spec).await,
            _ => {
                return Err(CloudError::UnsupportedResourceType {
                    provider: "gcp".to_string(),
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
