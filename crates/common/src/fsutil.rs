//! Local file helpers for run artifacts.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Write `content` to `path` unless the file already exists.
///
/// Returns `true` when the file was written, `false` when an existing file
/// was left untouched.
pub fn create_if_absent(path: &Path, content: &str) -> Result<bool> {
    if path.exists() {
        debug!("{} already present, leaving untouched", path.display());
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(true)
}

/// Remove the named entries (files or directories) under `base`.
///
/// Entries that are already absent are skipped silently. Every entry is
/// attempted even after a failure; the first real error is returned once
/// the pass completes. Returns the number of entries actually removed.
pub fn sweep(base: &Path, entries: &[String]) -> Result<usize> {
    let mut removed = 0;
    let mut first_error: Option<Error> = None;
    for entry in entries {
        let path = base.join(entry);
        match remove_path(&path) {
            Ok(true) => {
                debug!("removed {}", path.display());
                removed += 1;
            }
            Ok(false) => {}
            Err(err) => {
                warn!("failed to remove {}: {}", path.display(), err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(removed),
    }
}

fn remove_path(path: &Path) -> Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}
