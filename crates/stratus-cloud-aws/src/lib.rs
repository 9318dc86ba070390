//! AWS provider for Stratus
//!
//! Authenticates with per-request SigV4 signatures (AWS has no separate
//! token-exchange step), probes connectivity via STS `GetCallerIdentity`,
//! and provisions EC2 instances, RDS instances, and S3 buckets.

pub mod client;
pub mod error;
pub mod provider;
pub mod sigv4;
pub mod xml;

pub use client::{AwsClient, AwsEndpoints};
pub use error::AwsError;
pub use provider::AwsProvider;
pub use sigv4::{SigV4Signer, SignedHeaders, SigningInput};
