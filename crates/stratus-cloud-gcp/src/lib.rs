//! Google Cloud provider for Stratus
//!
//! Authenticates with an RS256 service-account assertion exchanged through
//! the OAuth2 jwt-bearer grant, probes connectivity with a Resource Manager
//! project read, and provisions Compute Engine instances and Cloud Storage
//! buckets.

pub mod error;
pub mod provider;
pub mod resources;
pub mod token;

pub use error::GcpError;
pub use provider::{GcpEndpoints, GcpProvider};
pub use token::{AssertionClaims, CLOUD_PLATFORM_SCOPE, DEFAULT_TOKEN_URL, GcpTokenClient, build_assertion};
