//! Cloud provider error types

use thiserror::Error;

/// Errors shared by all provider implementations
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Unsupported resource type '{resource_type}' for provider {provider}")]
    UnsupportedResourceType {
        provider: String,
        resource_type: String,
    },

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
