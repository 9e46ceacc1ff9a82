//! Install workflow: validate, pull, switch and verify a stable version
//!
//! ```text
//! Validating ──▶ LocalCheck ──(present)──────────────▶ Switching ──▶ Verifying ──▶ Success
//!                    │                                     ▲             │
//!                    └──(absent)──▶ Pulling ──(present)────┘             └──▶ Failed
//! ```
//!
//! Every step may end in `Failed`. Only one install runs at a time per orchestrator;
//! versions outside the catalog are rejected before that check.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::InstallConfig;
use crate::release::catalog::VersionCatalog;
use crate::release::error::{Fault, InstallError};
use crate::release::gateway::Gateway;
use crate::release::stable::filter_stable;
use crate::release::store::CatalogStore;
use crate::release::types::{InstallOutcome, InstallRequest};

/// Steps of the install workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    Validating,
    LocalCheck,
    Pulling,
    Switching,
    Verifying,
    Success,
    Failed(InstallError),
}

pub struct InstallOrchestrator<S: CatalogStore> {
    catalog: Arc<VersionCatalog<S>>,
    gateway: Arc<dyn Gateway>,
    repository: String,
    timings: InstallConfig,
    in_flight: Mutex<()>,
}

impl<S: CatalogStore> InstallOrchestrator<S> {
    pub fn new(
        catalog: Arc<VersionCatalog<S>>,
        gateway: Arc<dyn Gateway>,
        repository: &str,
        timings: InstallConfig,
    ) -> Self {
        Self {
            catalog,
            gateway,
            repository: repository.to_string(),
            timings,
            in_flight: Mutex::new(()),
        }
    }

    /// Download (if needed) and apply a stable version, then confirm it is running.
    ///
    /// Never fails: every error is reported through the returned outcome.
    pub async fn pull_and_apply(&self, version: &str) -> InstallOutcome {
        // Catalog membership is checked before the single-flight guard so that
        // unknown versions are reported as such even while another install runs.
        if let Err(e) = self.ensure_in_catalog(version).await {
            warn!("Rejecting install of {}: {}", version, e);
            return e.into();
        }

        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Rejecting install of {}: another install is running", version);
            return InstallError::InProgress.into();
        };

        info!("Starting install of version {}", version);
        match self.run(version).await {
            Ok(()) => {
                info!("Version {} applied", version);
                InstallOutcome::applied(version)
            }
            Err(e) => {
                warn!("Install of version {} failed: {}", version, e);
                e.into()
            }
        }
    }

    async fn run(&self, version: &str) -> Result<(), InstallError> {
        let request = InstallRequest::new(&self.repository, version);
        let mut state = InstallState::Validating;

        loop {
            debug!("Install {}: {:?}", version, state);
            state = match state {
                InstallState::Success => return Ok(()),
                InstallState::Failed(e) => return Err(e),
                current => self
                    .step(current, &request)
                    .await
                    .unwrap_or_else(InstallState::Failed),
            };
        }
    }

    async fn step(
        &self,
        state: InstallState,
        request: &InstallRequest,
    ) -> Result<InstallState, InstallError> {
        let version = request.tag.as_str();

        match state {
            InstallState::Validating => {
                let current = self.gateway.current_version().await?;
                if current == version {
                    return Err(InstallError::AlreadyInstalled);
                }

                Ok(InstallState::LocalCheck)
            }
            InstallState::LocalCheck => {
                if self.is_local(version).await? {
                    info!("Version {} is already in the local images", version);
                    Ok(InstallState::Switching)
                } else {
                    Ok(InstallState::Pulling)
                }
            }
            InstallState::Pulling => {
                info!("Version {} is not in the local images, pulling it", version);
                self.gateway.pull(request).await?;
                sleep(self.timings.settle_delay()).await;

                if self.is_local(version).await? {
                    Ok(InstallState::Switching)
                } else {
                    Err(InstallError::DownloadFailed)
                }
            }
            InstallState::Switching => {
                info!("Changing version to {}", version);
                self.gateway.switch(request).await?;
                sleep(self.timings.settle_delay()).await;
                Ok(InstallState::Verifying)
            }
            InstallState::Verifying => {
                info!("Checking if version is expected: {}", version);
                self.verify(version).await
            }
            InstallState::Success | InstallState::Failed(_) => Ok(state),
        }
    }

    async fn ensure_in_catalog(&self, version: &str) -> Result<(), InstallError> {
        let stables = self.catalog.stable_versions().await?;
        if stables.iter().any(|s| s == version) {
            Ok(())
        } else {
            Err(InstallError::InvalidVersion)
        }
    }

    async fn is_local(&self, version: &str) -> Result<bool, InstallError> {
        let local = self.gateway.local_inventory().await?;
        Ok(filter_stable(&local, Some(&self.repository))
            .iter()
            .any(|tag| tag == version))
    }

    /// Poll the running version until it answers, retrying transient faults only
    async fn verify(&self, version: &str) -> Result<InstallState, InstallError> {
        let max_attempts = self.timings.verify_max_attempts;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.gateway.current_version().await {
                Ok(current) if current == version => return Ok(InstallState::Success),
                Ok(current) => {
                    warn!(
                        "Running version is {} after switching to {}",
                        current, version
                    );
                    return Err(InstallError::ApplyFailed);
                }
                Err(e) if e.fault() == Fault::Transient => {
                    if max_attempts != 0 && attempt >= max_attempts {
                        warn!(
                            "Version chooser still unreachable after {} attempts: {}",
                            attempt, e
                        );
                        return Err(InstallError::ApplyFailed);
                    }
                    debug!(
                        "Version chooser unreachable (attempt {}), retrying: {}",
                        attempt, e
                    );
                    sleep(self.timings.verify_backoff()).await;
                }
                Err(e) => {
                    warn!("Failed to verify version {}: {}", version, e);
                    return Err(InstallError::ApplyFailed);
                }
            }
        }
    }
}
