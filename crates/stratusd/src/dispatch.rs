//! Provider dispatch: credential validation plus provider construction

use crate::state::AppState;
use stratus_cloud::{CloudProvider, Credentials, Provider, Result};
use stratus_cloud_aws::AwsProvider;
use stratus_cloud_azure::AzureProvider;
use stratus_cloud_gcp::GcpProvider;

/// Validate the raw credentials for the declared provider and build the
/// matching [`CloudProvider`]. Nothing here touches the network; the first
/// I/O happens inside the provider call itself.
pub fn build_provider(
    state: &AppState,
    provider: Provider,
    raw_credentials: &serde_json::Value,
) -> Result<Box<dyn CloudProvider>> {
    let credentials = Credentials::from_json(provider, raw_credentials)?;

    Ok(match credentials {
        Credentials::Aws(aws) => Box::new(AwsProvider::with_endpoints(
            state.http.clone(),
            aws,
            state.endpoints.aws.clone(),
        )),
        Credentials::Azure(azure) => Box::new(
            AzureProvider::with_endpoints(
                state.http.clone(),
                azure,
                state.endpoints.azure.clone(),
            )
            .with_polling(
                state.endpoints.azure_poll_interval,
                state.endpoints.azure_max_polls,
            ),
        ),
        Credentials::Gcp(gcp) => Box::new(GcpProvider::with_endpoints(
            state.http.clone(),
            gcp,
            state.endpoints.gcp.clone(),
        )),
    })
}
