//! Gateway trait for the release feed and the BlueOS version chooser

#[cfg(test)]
use mockall::automock;

use crate::release::error::GatewayError;
use crate::release::types::{InstallRequest, Release};

/// Network collaborator used by the catalog and the install workflow
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Tag of the version currently running on the deployment
    async fn current_version(&self) -> Result<String, GatewayError>;

    /// Images already present on the deployment
    async fn local_inventory(&self) -> Result<Vec<Release>, GatewayError>;

    /// Images available for the core repository, remote and local combined
    async fn remote_inventory(&self) -> Result<Vec<Release>, GatewayError>;

    /// Tags published on the public release feed
    async fn release_feed(&self) -> Result<Vec<String>, GatewayError>;

    /// Ask the version chooser to pull an image
    ///
    /// The version chooser may drop the connection while it works;
    /// that is not reported as an error.
    async fn pull(&self, request: &InstallRequest) -> Result<(), GatewayError>;

    /// Ask the version chooser to switch the running version
    async fn switch(&self, request: &InstallRequest) -> Result<(), GatewayError>;
}
