//! AWS provider error types

use stratus_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("AWS API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("AWS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed AWS response: {0}")]
    MalformedResponse(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

impl From<AwsError> for CloudError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::Api { status: 401 | 403, message } => {
                CloudError::AuthenticationFailed(message)
            }
            AwsError::MissingConfig(field) => {
                CloudError::InvalidRequest(format!("missing required configuration: {field}"))
            }
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
