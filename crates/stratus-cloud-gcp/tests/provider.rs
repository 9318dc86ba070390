//! Provider tests against a local server standing in for Google's OAuth2
//! token endpoint and the Compute / Storage / Resource Manager APIs.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use stratus_cloud::{CloudProvider, GcpCredentials, ResourceConfig, ResourceSpec, ServiceAccountKey};
use stratus_cloud_gcp::{GcpEndpoints, GcpProvider};
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn credentials() -> GcpCredentials {
    let mut rng = rand::thread_rng();
    let private_pem = RsaPrivateKey::new(&mut rng, 2048)
        .unwrap()
        .to_pkcs8_pem(LineEnding::LF)
        .unwrap()
        .to_string();
    GcpCredentials {
        key: ServiceAccountKey {
            client_email: "svc@acme-prod.iam.gserviceaccount.com".to_string(),
            private_key: private_pem,
            project_id: "acme-prod".to_string(),
            private_key_id: Some("key-1".to_string()),
        },
    }
}

fn token_route(captured: Arc<Mutex<Option<String>>>) -> Router {
    Router::new().route(
        "/token",
        post(move |body: String| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = Some(body);
                Json(json!({
                    "access_token": "ya29.test-token",
                    "expires_in": 3600,
                    "token_type": "Bearer",
                }))
            }
        }),
    )
}

fn endpoints(base: &str) -> GcpEndpoints {
    GcpEndpoints {
        token_url: format!("{base}/token"),
        compute_base: base.to_string(),
        storage_base: base.to_string(),
        crm_base: base.to_string(),
    }
}

#[tokio::test]
async fn test_instance_insert_exchanges_an_assertion_first() {
    let token_body: Arc<Mutex<Option<String>>> = Arc::default();

    let app = token_route(token_body.clone()).route(
        "/compute/v1/projects/{project}/zones/{zone}/instances",
        post(
            |Path((project, zone)): Path<(String, String)>, Json(body): Json<Value>| async move {
                Json(json!({
                    "name": "operation-123",
                    "status": "RUNNING",
                    "targetLink": format!(
                        "https://compute.googleapis.com/compute/v1/projects/{project}\
                         /zones/{zone}/instances/{}",
                        body["name"].as_str().unwrap_or_default()
                    ),
                }))
            },
        ),
    );
    let base = serve(app).await;

    let provider = GcpProvider::with_endpoints(reqwest::Client::new(), credentials(), endpoints(&base));

    let mut config = ResourceConfig::named("App VM");
    config.extra.insert("zone".to_string(), json!("europe-west1-b"));
    let result = provider
        .provision(&ResourceSpec::new("Compute Engine", config))
        .await
        .unwrap();

    assert!(result.success, "{result:?}");
    assert_eq!(result.resource_id.as_deref(), Some("appvm"));
    let details = result.details.as_ref().unwrap();
    assert_eq!(details["zone"], "europe-west1-b");
    assert_eq!(details["machineType"], "e2-medium");
    assert!(
        details["targetLink"]
            .as_str()
            .unwrap()
            .ends_with("/instances/appvm")
    );

    // The token exchange must have carried the jwt-bearer grant.
    let body = token_body.lock().unwrap().take().unwrap();
    assert!(
        body.contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"),
        "{body}"
    );
    assert!(body.contains("assertion="), "{body}");
}

#[tokio::test]
async fn test_bucket_insert_uses_the_request_location() {
    let app = token_route(Arc::default()).route(
        "/storage/v1/b",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "name": body["name"],
                "location": body["location"],
                "selfLink": format!(
                    "https://www.googleapis.com/storage/v1/b/{}",
                    body["name"].as_str().unwrap_or_default()
                ),
            }))
        }),
    );
    let base = serve(app).await;

    let provider = GcpProvider::with_endpoints(reqwest::Client::new(), credentials(), endpoints(&base));

    let mut config = ResourceConfig::named("artifact-store");
    config.region = Some("EU".to_string());
    let result = provider
        .provision(&ResourceSpec::new("Cloud Storage", config))
        .await
        .unwrap();

    assert!(result.success, "{result:?}");
    assert_eq!(result.resource_id.as_deref(), Some("artifact-store"));
    assert_eq!(result.details.as_ref().unwrap()["location"], "EU");
}

#[tokio::test]
async fn test_rejected_assertion_becomes_a_failed_probe() {
    let app = Router::new().route(
        "/token",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid JWT signature.",
                })),
            )
        }),
    );
    let base = serve(app).await;

    let provider = GcpProvider::with_endpoints(reqwest::Client::new(), credentials(), endpoints(&base));
    let report = provider.check_connectivity().await.unwrap();

    assert!(!report.success);
    assert!(report.is_real_time);
    assert!(
        report.error.as_deref().unwrap().contains("invalid_grant"),
        "{report:?}"
    );
}
