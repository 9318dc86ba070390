//! Stratus Cloud Abstraction
//!
//! This crate provides the provider abstraction for Stratus: typed
//! credential bundles, the `CloudProvider` trait, and the normalized result
//! shapes shared by every provider implementation.
//!
//! # Supported Providers
//!
//! - **AWS**: SigV4-signed STS/EC2/RDS/S3 calls
//! - **Azure**: Azure AD client-credentials + ARM
//! - **GCP**: service-account JWT bearer + Compute/Storage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    stratusd                      │
//! │   POST /provision-resource  /test-connectivity   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                stratus-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait CloudProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Credentials  │  │   Results    │            │
//! │  └──────────────┘  └──────────────┘            │
//! └──────┬───────────────┬───────────────┬──────────┘
//!        │               │               │
//! ┌──────▼─────┐ ┌───────▼──────┐ ┌──────▼─────┐
//! │    aws     │ │    azure     │ │    gcp     │
//! │  provider  │ │   provider   │ │  provider  │
//! └────────────┘ └──────────────┘ └────────────┘
//! ```

pub mod credentials;
pub mod error;
pub mod provider;
pub mod report;
pub mod resource;

// Re-exports
pub use credentials::{
    AwsCredentials, AzureCredentials, Credentials, DEFAULT_AWS_REGION, GcpCredentials, Provider,
    ServiceAccountKey,
};
pub use error::{CloudError, Result};
pub use provider::CloudProvider;
pub use report::{ConnectivityReport, ProvisionResult};
pub use resource::{ResourceConfig, ResourceSpec, sanitize_name};
