//! Azure provider for Stratus
//!
//! Authenticates with an OAuth2 client-credentials grant against Azure AD,
//! probes connectivity with a subscription read, and provisions virtual
//! machines and storage accounts through Azure Resource Manager, polling
//! long-running operations to completion.

pub mod arm;
pub mod error;
pub mod provider;
pub mod token;

pub use arm::{ArmClient, DEFAULT_ARM_BASE};
pub use error::AzureError;
pub use provider::{AzureEndpoints, AzureProvider};
pub use token::{ARM_SCOPE, AzureAdClient, DEFAULT_LOGIN_BASE};
