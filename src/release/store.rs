//! Flat-file persistence for the stable catalog

use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::release::error::StoreError;

/// Trait for storing and retrieving the cached catalog
#[cfg_attr(test, automock)]
pub trait CatalogStore: Send + Sync + 'static {
    /// Cached stable tags, in stored order; empty if nothing was stored yet
    fn read_stables(&self) -> Result<Vec<String>, StoreError>;

    /// Replace all cached stable tags
    fn write_stables(&self, stables: &[String]) -> Result<(), StoreError>;

    /// Timestamp of the last refresh, if any
    fn read_last_updated(&self) -> Result<Option<String>, StoreError>;

    /// Replace the last refresh timestamp
    fn write_last_updated(&self, timestamp: &str) -> Result<(), StoreError>;
}

/// Stores the catalog as two flat files: a newline-delimited tag list and a timestamp
pub struct FileStore {
    stables_path: PathBuf,
    last_updated_path: PathBuf,
}

impl FileStore {
    pub fn new(stables_path: &Path, last_updated_path: &Path) -> Self {
        Self {
            stables_path: stables_path.to_path_buf(),
            last_updated_path: last_updated_path.to_path_buf(),
        }
    }

    /// Store both files in `dir` with their default names
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(&dir.join("stables.txt"), &dir.join("last_updated.txt"))
    }

    fn read(path: &Path) -> Result<String, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(io_error(path, source)),
        }
    }

    /// Write to a temp file next to the target, then rename over it
    fn replace(path: &Path, content: &str) -> Result<(), StoreError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| io_error(path, e))?;
        file.as_file().sync_all().map_err(|e| io_error(path, e))?;
        file.persist(path).map_err(|e| io_error(path, e.error))?;

        debug!("Replaced {:?} ({} bytes)", path, content.len());
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl CatalogStore for FileStore {
    fn read_stables(&self) -> Result<Vec<String>, StoreError> {
        let content = Self::read(&self.stables_path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn write_stables(&self, stables: &[String]) -> Result<(), StoreError> {
        let content: String = stables.iter().map(|s| format!("{}\n", s)).collect();
        Self::replace(&self.stables_path, &content)
    }

    fn read_last_updated(&self) -> Result<Option<String>, StoreError> {
        let content = Self::read(&self.last_updated_path)?;
        let trimmed = content.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    fn write_last_updated(&self, timestamp: &str) -> Result<(), StoreError> {
        Self::replace(&self.last_updated_path, timestamp)
    }
}
