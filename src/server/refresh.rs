//! Background refresh of the stable catalog

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::config::CacheConfig;
use crate::release::catalog::VersionCatalog;
use crate::release::store::CatalogStore;

/// Refresh the catalog if it is older than `max_age`
///
/// Returns true if a refresh happened and succeeded. Errors are logged.
pub async fn refresh_if_stale<S: CatalogStore>(
    catalog: &VersionCatalog<S>,
    max_age: chrono::Duration,
) -> bool {
    let stale = catalog
        .is_stale(max_age)
        .inspect_err(|e| error!("Failed to read catalog timestamp: {}", e))
        .unwrap_or(true);

    if !stale {
        debug!("Stable catalog is fresh, skipping refresh");
        return false;
    }

    info!("Stable catalog is stale, refreshing");
    catalog
        .refresh()
        .await
        .inspect_err(|e| error!("Failed to refresh stable catalog: {}", e))
        .is_ok()
}

/// Periodically refresh a stale catalog until the task is aborted
pub fn spawn_background_refresh<S: CatalogStore>(
    catalog: Arc<VersionCatalog<S>>,
    cache: &CacheConfig,
) -> JoinHandle<()> {
    let max_age = chrono::Duration::milliseconds(cache.refresh_interval);
    let period = Duration::from_millis(cache.check_interval.max(1));

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            refresh_if_stale(&catalog, max_age).await;
        }
    })
}
