use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default catalog refresh interval in milliseconds (24 hours)
pub const DEFAULT_REFRESH_INTERVAL_MS: i64 = 24 * 60 * 60 * 1000;

/// How often the background task checks catalog staleness (1 hour)
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Wait after issuing a pull or switch before re-checking state (10 seconds)
pub const SETTLE_DELAY_MS: u64 = 10_000;

/// Wait between verification polls while the version chooser is unreachable (20 seconds)
pub const VERIFY_BACKOFF_MS: u64 = 20_000;

/// Maximum number of verification polls (30 polls at 20s is about 10 minutes)
pub const VERIFY_MAX_ATTEMPTS: u32 = 30;

/// Timeout for query requests to the version chooser and the release feed (30 seconds)
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Timeout for pull and switch commands, which may run while an image downloads (5 minutes)
pub const COMMAND_TIMEOUT_MS: u64 = 5 * 60 * 1000;

// =============================================================================
// Upstream defaults
// =============================================================================

pub const DEFAULT_BLUEOS_URL: &str = "http://host.docker.internal";
pub const DEFAULT_FEED_URL: &str =
    "https://api.github.com/repos/bluerobotics/BlueOS/releases?per_page=100";
pub const CORE_REPOSITORY: &str = "bluerobotics/blueos-core";
pub const DEFAULT_DATA_DIR: &str = "/var/lib/stabler";

/// Service configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub server: ServerConfig,
    /// Base URL of the BlueOS host running the version chooser
    pub blueos_url: String,
    /// Release feed listing published releases
    pub feed_url: String,
    /// Number of feed pages to follow through `Link: rel="next"`
    pub feed_max_pages: u32,
    /// Core image repository that stable releases must belong to
    pub repository: String,
    pub catalog_source: CatalogSource,
    pub data_dir: PathBuf,
    pub install: InstallConfig,
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            blueos_url: DEFAULT_BLUEOS_URL.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            feed_max_pages: 1,
            repository: CORE_REPOSITORY.to_string(),
            catalog_source: CatalogSource::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            install: InstallConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Where the catalog of stable releases is discovered
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CatalogSource {
    /// Public release feed (GitHub releases)
    #[default]
    ReleaseFeed,
    /// Remote and local inventory reported by the version chooser
    Inventory,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8123,
        }
    }
}

/// Install workflow timings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InstallConfig {
    pub settle_delay_ms: u64,
    pub verify_backoff_ms: u64,
    /// Verification polls before giving up; 0 polls until the service answers
    pub verify_max_attempts: u32,
    pub request_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: SETTLE_DELAY_MS,
            verify_backoff_ms: VERIFY_BACKOFF_MS,
            verify_max_attempts: VERIFY_MAX_ATTEMPTS,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            command_timeout_ms: COMMAND_TIMEOUT_MS,
        }
    }
}

impl InstallConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn verify_backoff(&self) -> Duration {
        Duration::from_millis(self.verify_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// Catalog cache configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Catalog refresh interval in milliseconds
    pub refresh_interval: i64,
    /// Staleness check interval in milliseconds
    pub check_interval: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            check_interval: DEFAULT_CHECK_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Load configuration from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Apply environment overrides using the given lookup.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("BLUEOS_URL").filter(|v| !v.is_empty()) {
            self.blueos_url = url;
        }
        if let Some(url) = lookup("STABLER_FEED_URL").filter(|v| !v.is_empty()) {
            self.feed_url = url;
        }
        if let Some(dir) = lookup("STABLER_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    /// Base endpoint of the version chooser API
    pub fn version_chooser_url(&self) -> String {
        format!(
            "{}/version-chooser/v1.0/version",
            self.blueos_url.trim_end_matches('/')
        )
    }

    pub fn stables_path(&self) -> PathBuf {
        self.data_dir.join("stables.txt")
    }

    pub fn last_updated_path(&self) -> PathBuf {
        self.data_dir.join("last_updated.txt")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
