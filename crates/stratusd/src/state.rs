//! Shared daemon state

use std::time::Duration;
use stratus_cloud_aws::AwsEndpoints;
use stratus_cloud_azure::AzureEndpoints;
use stratus_cloud_gcp::GcpEndpoints;

/// Outbound endpoint configuration for all providers.
///
/// Defaults target the public clouds; integration tests and local emulators
/// override individual bases.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub aws: AwsEndpoints,
    pub azure: AzureEndpoints,
    pub gcp: GcpEndpoints,

    /// Azure LRO polling cadence; tightened by tests
    pub azure_poll_interval: Duration,
    pub azure_max_polls: u32,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            aws: AwsEndpoints::default(),
            azure: AzureEndpoints::default(),
            gcp: GcpEndpoints::default(),
            azure_poll_interval: Duration::from_secs(5),
            azure_max_polls: 60,
        }
    }
}

/// Per-request application state
///
/// The HTTP client is the only shared handle; credentials and tokens are
/// request-scoped and never stored here.
#[derive(Debug, Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub endpoints: Endpoints,
}

impl AppState {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Endpoints::default())
    }
}
