//! Azure provider error types

use stratus_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Azure AD authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Azure API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Azure request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed Azure response: {0}")]
    MalformedResponse(String),

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Operation did not complete: {0}")]
    OperationTimeout(String),
}

impl From<AzureError> for CloudError {
    fn from(err: AzureError) -> Self {
        match err {
            AzureError::AuthenticationFailed(msg) => CloudError::AuthenticationFailed(msg),
            AzureError::MissingConfig(field) => {
                CloudError::InvalidRequest(format!("missing required configuration: {field}"))
            }
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AzureError>;
