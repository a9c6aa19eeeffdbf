//! Error helpers for routesync-store
//!
//! Builds `routesync_core::errors::StoreError` values with path context.

use std::path::Path;

use routesync_core::errors::StoreError;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Create an IO error for `op` on `path`
pub fn io_error(op: &'static str, path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Io {
        op,
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Create a decode error for a baseline file that is not a route array
pub fn corrupt(path: &Path, err: serde_json::Error) -> StoreError {
    StoreError::Corrupt {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
