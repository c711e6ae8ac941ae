//! Change-set application to a working tree
//!
//! Every target path is validated before the first write, then each file is
//! written through a temp file in the target directory and renamed into
//! place, so a torn write can never be observed at the final path. A write
//! failure mid-set is surfaced to the caller; partially applied sets are the
//! caller's rollback problem.

use ferry_core::{FerryError, Result};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::changeset::ChangeSet;

/// Validate that a relative path is safe to write through
///
/// Rejects absolute paths, parent-directory traversal, and anything under or
/// named as a protected entry.
pub fn validate_path(path: &str, protected: &[String]) -> Result<PathBuf> {
    let candidate = Path::new(path);

    if candidate.is_absolute() {
        return Err(FerryError::PathValidation(format!(
            "absolute paths not allowed: {}",
            candidate.display()
        )));
    }

    for component in candidate.components() {
        if matches!(component, Component::ParentDir) {
            return Err(FerryError::PathValidation(format!(
                "path traversal not allowed: {}",
                candidate.display()
            )));
        }
    }

    for entry in protected {
        let is_protected_name = candidate
            .file_name()
            .map(|name| name == Path::new(entry).as_os_str())
            .unwrap_or(false);
        if candidate.starts_with(entry) || is_protected_name {
            return Err(FerryError::PathValidation(format!(
                "cannot write to protected path: {}",
                candidate.display()
            )));
        }
    }

    Ok(candidate.to_path_buf())
}

/// Apply a change-set under `root`, returning the relative paths written
///
/// The whole set is path-validated up front; nothing is written if any entry
/// is rejected. Parent directories are created as needed.
pub fn apply_change_set(
    root: &Path,
    set: &ChangeSet,
    protected: &[String],
) -> Result<Vec<PathBuf>> {
    let mut targets = Vec::with_capacity(set.len());
    for change in set.iter() {
        targets.push(validate_path(&change.path, protected)?);
    }

    let mut written = Vec::with_capacity(set.len());
    for (change, relative) in set.iter().zip(targets) {
        let absolute = root.join(&relative);
        write_file(&absolute, &change.content)
            .map_err(|e| FerryError::Write(format!("{}: {}", change.path, e)))?;
        debug!("Wrote {} ({} bytes)", change.path, change.content.len());
        written.push(relative);
    }

    Ok(written)
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
