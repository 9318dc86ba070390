//! Azure AD OAuth2 client-credentials grant

use crate::error::{AzureError, Result};
use serde::Deserialize;
use stratus_cloud::AzureCredentials;

pub const DEFAULT_LOGIN_BASE: &str = "https://login.microsoftonline.com";

/// Scope granting access to Azure Resource Manager
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

/// Provider error bodies are surfaced to operators but bounded so a giant
/// diagnostic payload never lands in a result envelope verbatim.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Azure AD token client; one grant per call, nothing is cached
pub struct AzureAdClient {
    http: reqwest::Client,
    login_base: String,
}

impl AzureAdClient {
    pub fn new(http: reqwest::Client, login_base: impl Into<String>) -> Self {
        Self {
            http,
            login_base: login_base.into(),
        }
    }

    /// Exchange the service principal's secret for a short-lived ARM bearer
    /// token via the tenant's v2.0 token endpoint.
    pub async fn acquire_token(&self, credentials: &AzureCredentials) -> Result<String> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base.trim_end_matches('/'),
            credentials.tenant_id,
        );

        tracing::debug!(tenant = %credentials.tenant_id, "requesting azure ad token");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("scope", ARM_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AzureError::AuthenticationFailed(truncate(&body)));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AzureError::MalformedResponse(format!("token response: {e}")))?;
        Ok(token.access_token)
    }
}

/// Bound an error body to `ERROR_BODY_LIMIT` characters, marker included
pub(crate) fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_LIMIT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_BODY_LIMIT - 1).collect();
        format!("{cut}…")
    }
}
