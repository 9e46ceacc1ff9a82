//! Catalog of stable releases with cache-or-refresh semantics

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::CatalogSource;
use crate::release::error::CatalogError;
use crate::release::gateway::Gateway;
use crate::release::stable::{filter_stable, filter_stable_tags};
use crate::release::store::CatalogStore;

/// Format of the persisted refresh timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct VersionCatalog<S: CatalogStore> {
    store: Arc<S>,
    gateway: Arc<dyn Gateway>,
    source: CatalogSource,
    repository: String,
    refresh_lock: Mutex<()>,
}

impl<S: CatalogStore> VersionCatalog<S> {
    pub fn new(
        store: Arc<S>,
        gateway: Arc<dyn Gateway>,
        source: CatalogSource,
        repository: &str,
    ) -> Self {
        Self {
            store,
            gateway,
            source,
            repository: repository.to_string(),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Cached stable tags, newest first; refreshes first if the cache is empty
    pub async fn stable_versions(&self) -> Result<Vec<String>, CatalogError> {
        let stables = self.store.read_stables()?;
        if !stables.is_empty() {
            return Ok(stables);
        }

        debug!("Stable catalog is empty, refreshing");
        self.refresh().await?;
        Ok(self.store.read_stables()?)
    }

    /// Timestamp of the last refresh; refreshes first if none was recorded
    pub async fn last_updated(&self) -> Result<String, CatalogError> {
        match self.store.read_last_updated()? {
            Some(timestamp) => Ok(timestamp),
            None => self.refresh().await,
        }
    }

    /// Returns true if the catalog was never refreshed or is older than `max_age`
    pub fn is_stale(&self, max_age: chrono::Duration) -> Result<bool, CatalogError> {
        let Some(timestamp) = self.store.read_last_updated()? else {
            return Ok(true);
        };

        match NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT) {
            Ok(updated) => Ok(Local::now().naive_local() - updated > max_age),
            Err(e) => {
                warn!("Unreadable catalog timestamp {:?}: {}", timestamp, e);
                Ok(true)
            }
        }
    }

    /// Fetch the upstream releases and replace the cached catalog.
    ///
    /// Returns the new refresh timestamp. On fetch failure the cache is left untouched.
    pub async fn refresh(&self) -> Result<String, CatalogError> {
        let _guard = self.refresh_lock.lock().await;

        let stables = self.fetch_stables().await?;
        self.store.write_stables(&stables)?;

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.store.write_last_updated(&timestamp)?;

        info!(
            "Refreshed stable catalog with {} versions at {}",
            stables.len(),
            timestamp
        );
        Ok(timestamp)
    }

    async fn fetch_stables(&self) -> Result<Vec<String>, CatalogError> {
        let stables = match self.source {
            CatalogSource::ReleaseFeed => {
                let tags = self.gateway.release_feed().await?;
                filter_stable_tags(tags.iter().map(String::as_str))
            }
            CatalogSource::Inventory => {
                let releases = self.gateway.remote_inventory().await?;
                filter_stable(&releases, Some(&self.repository))
            }
        };
        Ok(stables)
    }
}
