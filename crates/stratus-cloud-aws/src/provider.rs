//! AWS provider implementation

use crate::client::{AwsClient, AwsEndpoints};
use crate::error::{AwsError, Result as AwsResult};
use crate::xml;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use stratus_cloud::{
    AwsCredentials, CloudError, CloudProvider, ConnectivityReport, ProvisionResult, ResourceSpec,
};

const EC2_API_VERSION: &str = "2016-11-15";
const RDS_API_VERSION: &str = "2014-10-31";
const STS_API_VERSION: &str = "2011-06-15";

const DEFAULT_INSTANCE_TYPE: &str = "t3.micro";
const DEFAULT_DB_CLASS: &str = "db.t3.micro";
const DEFAULT_DB_ENGINE: &str = "mysql";
const DEFAULT_DB_STORAGE_GB: u32 = 20;
// Amazon Linux 2023 in us-east-1; callers pass imageId for anything else.
const DEFAULT_IMAGE_ID: &str = "ami-0c02fb55956c7d316";

/// AWS provider
pub struct AwsProvider {
    client: AwsClient,
}

impl AwsProvider {
    pub fn new(http: reqwest::Client, credentials: AwsCredentials) -> Self {
        Self::with_endpoints(http, credentials, AwsEndpoints::default())
    }

    pub fn with_endpoints(
        http: reqwest::Client,
        credentials: AwsCredentials,
        endpoints: AwsEndpoints,
    ) -> Self {
        Self {
            client: AwsClient::new(http, credentials, endpoints),
        }
    }

    fn region_for(&self, spec: &ResourceSpec) -> String {
        spec.config
            .region
            .clone()
            .unwrap_or_else(|| self.client.credentials().region.clone())
    }

    async fn run_instances(&self, spec: &ResourceSpec) -> AwsResult<ProvisionResult> {
        let region = self.region_for(spec);
        let name = spec.config.sanitized_name();
        let instance_type = spec
            .config
            .size
            .clone()
            .unwrap_or_else(|| DEFAULT_INSTANCE_TYPE.to_string());
        let image_id = spec
            .config
            .extra_str("imageId")
            .unwrap_or(DEFAULT_IMAGE_ID)
            .to_string();

        let mut params = vec![
            ("Action".to_string(), "RunInstances".to_string()),
            ("Version".to_string(), EC2_API_VERSION.to_string()),
            ("ImageId".to_string(), image_id.clone()),
            ("InstanceType".to_string(), instance_type.clone()),
            ("MinCount".to_string(), "1".to_string()),
            ("MaxCount".to_string(), "1".to_string()),
        ];
        if let Some(subnet) = spec.config.extra_str("subnet") {
            params.push(("SubnetId".to_string(), subnet.to_string()));
        }
        if let Some(groups) = spec.config.extra.get("securityGroups").and_then(Value::as_array) {
            for (i, group) in groups.iter().filter_map(Value::as_str).enumerate() {
                params.push((format!("SecurityGroupId.{}", i + 1), group.to_string()));
            }
        }

        params.push((
            "TagSpecification.1.ResourceType".to_string(),
            "instance".to_string(),
        ));
        params.push(("TagSpecification.1.Tag.1.Key".to_string(), "Name".to_string()));
        params.push(("TagSpecification.1.Tag.1.Value".to_string(), name.clone()));
        for (i, (key, value)) in sorted_tags(spec).into_iter().enumerate() {
            params.push((format!("TagSpecification.1.Tag.{}.Key", i + 2), key));
            params.push((format!("TagSpecification.1.Tag.{}.Value", i + 2), value));
        }

        let body = self.client.query_request("ec2", &region, &params).await?;
        let instance_id = xml::first_tag_text(&body, "instanceId")
            .ok_or_else(|| {
                AwsError::MalformedResponse("RunInstances response has no instanceId".to_string())
            })?
            .to_string();

        tracing::info!(instance_id, instance_type, region, "ec2 instance launched");

        Ok(ProvisionResult::ok(
            instance_id.clone(),
            details(json!({
                "provider": "aws",
                "type": "EC2 Instance",
                "instanceId": instance_id,
                "instanceType": instance_type,
                "imageId": image_id,
                "region": region,
            })),
        ))
    }

    async fn create_db_instance(&self, spec: &ResourceSpec) -> AwsResult<ProvisionResult> {
        let region = self.region_for(spec);
        let identifier = spec.config.sanitized_name();
        let class = spec
            .config
            .size
            .clone()
            .unwrap_or_else(|| DEFAULT_DB_CLASS.to_string());
        let engine = spec
            .config
            .extra_str("engine")
            .unwrap_or(DEFAULT_DB_ENGINE)
            .to_string();
        let username = spec
            .config
            .extra_str("masterUsername")
            .unwrap_or("admin")
            .to_string();
        let password = spec
            .config
            .extra_str("masterPassword")
            .ok_or_else(|| AwsError::MissingConfig("masterPassword".to_string()))?
            .to_string();
        let storage = spec.config.storage_size.unwrap_or(DEFAULT_DB_STORAGE_GB);

        let mut params = vec![
            ("Action".to_string(), "CreateDBInstance".to_string()),
            ("Version".to_string(), RDS_API_VERSION.to_string()),
            ("DBInstanceIdentifier".to_string(), identifier.clone()),
            ("DBInstanceClass".to_string(), class.clone()),
            ("Engine".to_string(), engine.clone()),
            ("MasterUsername".to_string(), username),
            ("MasterUserPassword".to_string(), password),
            ("AllocatedStorage".to_string(), storage.to_string()),
        ];
        for (i, (key, value)) in sorted_tags(spec).into_iter().enumerate() {
            params.push((format!("Tags.member.{}.Key", i + 1), key));
            params.push((format!("Tags.member.{}.Value", i + 1), value));
        }

        let body = self.client.query_request("rds", &region, &params).await?;
        let resource_id = xml::first_tag_text(&body, "DBInstanceIdentifier")
            .unwrap_or(&identifier)
            .to_string();

        tracing::info!(db_instance = resource_id, engine, region, "rds instance created");

        Ok(ProvisionResult::ok(
            resource_id.clone(),
            details(json!({
                "provider": "aws",
                "type": "RDS Instance",
                "dbInstanceIdentifier": resource_id,
                "dbInstanceClass": class,
                "engine": engine,
                "allocatedStorage": storage,
                "region": region,
            })),
        ))
    }

    async fn create_bucket(&self, spec: &ResourceSpec) -> AwsResult<ProvisionResult> {
        let region = self.region_for(spec);
        let bucket = spec.config.sanitized_name();

        self.client.create_bucket(&bucket, &region).await?;

        tracing::info!(bucket, region, "s3 bucket created");

        Ok(ProvisionResult::ok(
            bucket.clone(),
            details(json!({
                "provider": "aws",
                "type": "S3 Bucket",
                "bucketName": bucket,
                "arn": format!("arn:aws:s3:::{bucket}"),
                "region": region,
            })),
        ))
    }
}

#[async_trait]
impl CloudProvider for AwsProvider {
    fn name(&self) -> &str {
        "aws"
    }

    fn display_name(&self) -> &str {
        "Amazon Web Services"
    }

    async fn check_connectivity(&self) -> stratus_cloud::Result<ConnectivityReport> {
        let region = self.client.credentials().region.clone();
        let params = vec![
            ("Action".to_string(), "GetCallerIdentity".to_string()),
            ("Version".to_string(), STS_API_VERSION.to_string()),
        ];

        let body = match self.client.query_request("sts", &region, &params).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "aws connectivity probe failed");
                return Ok(ConnectivityReport::failed("aws", e.to_string()));
            }
        };

        let account_id = xml::first_tag_text(&body, "Account").unwrap_or_default();
        let arn = xml::first_tag_text(&body, "Arn").unwrap_or_default();
        let user_id = xml::first_tag_text(&body, "UserId").unwrap_or_default();
        if account_id.is_empty() {
            return Ok(ConnectivityReport::failed(
                "aws",
                "STS response did not contain a caller identity",
            ));
        }

        Ok(ConnectivityReport::ok(
            "aws",
            details(json!({
                "accountId": account_id,
                "arn": arn,
                "userId": user_id,
                "region": region,
            })),
        ))
    }

    async fn provision(&self, spec: &ResourceSpec) -> stratus_cloud::Result<ProvisionResult> {
        let outcome = match spec.type_key().as_str() {
            "ec2" | "ec2 instance" => self.run_instances(spec).await,
            "rds" | "rds instance" => self.create_db_instance(spec).await,
            "s3" | "s3 bucket" => self.create_bucket(spec).await,
            _ => {
                return Err(CloudError::UnsupportedResourceType {
                    provider: "aws".to_string(),
                    resource_type: spec.resource_type.clone(),
                });
            }
        };

        // API-level failures keep the provider's own error text; operators
        // diagnose from it in the dashboard.
        Ok(outcome.unwrap_or_else(|e| ProvisionResult::failed(e.to_string())))
    }
}

fn sorted_tags(spec: &ResourceSpec) -> Vec<(String, String)> {
    let mut tags: Vec<(String, String)> = spec
        .config
        .tags
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    tags.sort();
    tags
}

fn details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
