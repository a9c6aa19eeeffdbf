//! Atomic write primitives
//!
//! Uses temp→rename pattern to ensure no partial writes

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{io_error, Result};

/// `<target>.tmp`, in the same directory as the target
pub fn temp_path(target_path: &Path) -> PathBuf {
    let mut name = OsString::from(target_path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Atomically write bytes to a file
///
/// Uses temp file + rename. The temp file is flushed to disk before the
/// rename and removed if the write or rename fails.
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error("create_dir", parent, e))?;
        }
    }

    let temp = temp_path(target_path);
    if let Err(e) = write_synced(&temp, content) {
        let _ = fs::remove_file(&temp);
        return Err(io_error("write_temp", &temp, e));
    }

    if let Err(e) = fs::rename(&temp, target_path) {
        let _ = fs::remove_file(&temp);
        return Err(io_error("rename_temp", target_path, e));
    }

    Ok(())
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
