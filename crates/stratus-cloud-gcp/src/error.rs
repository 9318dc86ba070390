//! GCP provider error types

use stratus_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    #[error("Google OAuth2 authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("GCP API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GCP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed GCP response: {0}")]
    MalformedResponse(String),
}

impl From<GcpError> for CloudError {
    fn from(err: GcpError) -> Self {
        match err {
            GcpError::InvalidKey(msg) => CloudError::InvalidCredentials(msg),
            GcpError::AuthenticationFailed(msg) => CloudError::AuthenticationFailed(msg),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GcpError>;
