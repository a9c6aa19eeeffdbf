//! JSON file baseline store
//!
//! The baseline is a pretty-printed JSON array of routes with a trailing
//! newline. A missing or empty file is an empty baseline.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use routesync_core::errors::StoreError;
use routesync_core::store::{normalize_for_save, RouteStore};
use routesync_core::Route;

use crate::atomic::atomic_write;
use crate::errors::{corrupt, io_error, Result};

/// File-backed `RouteStore`
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the baseline file; a missing file is not an error
    ///
    /// # Errors
    ///
    /// `EmptyPath`, or the IO error from removing the file.
    pub fn clear(&self) -> Result<()> {
        let path = self.checked_path()?;
        match fs::remove_file(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Cleared route baseline");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", path, e)),
        }
    }

    fn checked_path(&self) -> Result<&Path> {
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::EmptyPath);
        }
        Ok(&self.path)
    }
}

impl RouteStore for FileStore {
    fn load(&self) -> Result<Vec<Route>> {
        let path = self.checked_path()?;
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("read", path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let routes: Vec<Route> = serde_json::from_str(&content).map_err(|e| corrupt(path, e))?;
        tracing::debug!(
            path = %path.display(),
            routes = routes.len(),
            "Loaded route baseline"
        );
        Ok(routes)
    }

    fn save(&self, routes: &[Route]) -> Result<()> {
        let path = self.checked_path()?;
        let normalized = normalize_for_save(routes)?;

        let mut json = serde_json::to_string_pretty(&normalized)
            .map_err(|e| StoreError::backend(format!("encode baseline: {e}")))?;
        json.push('\n');
        atomic_write(path, json.as_bytes())?;

        tracing::debug!(
            path = %path.display(),
            routes = normalized.len(),
            size_bytes = json.len(),
            "Saved route baseline"
        );
        Ok(())
    }
}
