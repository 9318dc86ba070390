//! Request handlers for the provisioning and connectivity endpoints
//!
//! Every code path, including malformed bodies and unexpected provider
//! errors, resolves to a well-formed JSON envelope; nothing is allowed to
//! escape as a bare error or a hanging connection.

use crate::dispatch;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::str::FromStr;
use stratus_cloud::{ConnectivityReport, Provider, ProvisionResult, ResourceConfig, ResourceSpec};

/// Wire shape of `POST /provision-resource`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub config: Option<ResourceConfig>,
    #[serde(default)]
    pub credentials: Option<Value>,
}

/// Wire shape of `POST /test-connectivity`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityRequest {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub credentials: Option<Value>,
}

pub async fn provision_resource(
    State(state): State<AppState>,
    body: Result<Json<ProvisionRequest>, JsonRejection>,
) -> (StatusCode, Json<ProvisionResult>) {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(format!("invalid request body: {rejection}")),
    };

    let Some(provider_raw) = nonempty(request.provider) else {
        return bad_request("missing required field: provider");
    };
    let Some(credentials) = present_object(request.credentials) else {
        return bad_request("missing required field: credentials");
    };
    let Some(resource_type) = nonempty(request.resource_type) else {
        return bad_request("missing required field: resourceType");
    };
    let config = request.config.unwrap_or_default();
    if config.name.trim().is_empty() {
        return bad_request("missing required field: config.name");
    }

    // Unknown providers and partial credential bundles never reach
    // provider code; both are request validation failures here.
    let provider = match Provider::from_str(&provider_raw) {
        Ok(provider) => provider,
        Err(e) => return bad_request(e.to_string()),
    };
    let cloud = match dispatch::build_provider(&state, provider, &credentials) {
        Ok(cloud) => cloud,
        Err(e) => return bad_request(e.to_string()),
    };

    let spec = ResourceSpec::new(resource_type, config);
    tracing::info!(
        provider = %provider,
        resource_type = %spec.resource_type,
        account_id = request.account_id.as_deref().unwrap_or("-"),
        "provision request"
    );

    let result = match cloud.provision(&spec).await {
        Ok(result) => result,
        // Past validation every failure is a result, not a status code.
        Err(e) => ProvisionResult::failed(e.to_string()),
    };

    if result.success {
        tracing::info!(
            provider = %provider,
            resource_id = result.resource_id.as_deref().unwrap_or(""),
            "provision succeeded"
        );
    } else {
        tracing::warn!(
            provider = %provider,
            error = result.error.as_deref().unwrap_or(""),
            "provision failed"
        );
    }

    (StatusCode::OK, Json(result))
}

pub async fn test_connectivity(
    State(state): State<AppState>,
    body: Result<Json<ConnectivityRequest>, JsonRejection>,
) -> (StatusCode, Json<ConnectivityReport>) {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ConnectivityReport::rejected(
                    "unknown",
                    format!("invalid request body: {rejection}"),
                )),
            );
        }
    };

    let Some(provider_raw) = nonempty(request.provider) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ConnectivityReport::rejected(
                "unknown",
                "missing required field: provider",
            )),
        );
    };
    let Some(credentials) = present_object(request.credentials) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ConnectivityReport::rejected(
                provider_raw,
                "missing required field: credentials",
            )),
        );
    };

    // Probe outcomes all share one shape and a 200 status: an unknown
    // provider or a partial bundle is just a probe that failed before the
    // network.
    let provider = match Provider::from_str(&provider_raw) {
        Ok(provider) => provider,
        Err(e) => {
            return (
                StatusCode::OK,
                Json(ConnectivityReport::rejected(provider_raw, e.to_string())),
            );
        }
    };
    let cloud = match dispatch::build_provider(&state, provider, &credentials) {
        Ok(cloud) => cloud,
        Err(e) => {
            return (
                StatusCode::OK,
                Json(ConnectivityReport::rejected(
                    provider.as_str(),
                    e.to_string(),
                )),
            );
        }
    };

    tracing::info!(provider = %provider, "connectivity probe");

    let report = match cloud.check_connectivity().await {
        Ok(report) => report,
        Err(e) => ConnectivityReport::failed(provider.as_str(), e.to_string()),
    };

    (StatusCode::OK, Json(report))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn bad_request(error: impl Into<String>) -> (StatusCode, Json<ProvisionResult>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ProvisionResult::failed(error)),
    )
}

fn nonempty(field: Option<String>) -> Option<String> {
    field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn present_object(field: Option<Value>) -> Option<Value> {
    field.filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
}
