//! Directory Enumerator
//!
//! Lists the immediate sub-directories of the source and destination parent
//! directories. Each sub-directory is one store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, Result};

/// The two sub-directory listings a reconciliation pass works from
pub trait DirectoryListing: Send + Sync {
    fn source_directories(&self) -> &[PathBuf];
    fn destination_directories(&self) -> &[PathBuf];
}

/// Directory listing read eagerly from disk at construction
#[derive(Debug, Clone)]
pub struct DirectoriesHandler {
    source_dirs: Vec<PathBuf>,
    destination_dirs: Vec<PathBuf>,
}

impl DirectoriesHandler {
    /// List both parent directories
    ///
    /// Fails with `PathUnreadable` if either parent cannot be listed.
    pub fn new(source_parent: impl AsRef<Path>, destination_parent: impl AsRef<Path>) -> Result<Self> {
        let source_dirs = inner_directories(source_parent.as_ref())?;
        let destination_dirs = inner_directories(destination_parent.as_ref())?;

        tracing::debug!(
            source = source_dirs.len(),
            destination = destination_dirs.len(),
            "sub-directories listed"
        );

        Ok(Self {
            source_dirs,
            destination_dirs,
        })
    }
}

impl DirectoryListing for DirectoriesHandler {
    fn source_directories(&self) -> &[PathBuf] {
        &self.source_dirs
    }

    fn destination_directories(&self) -> &[PathBuf] {
        &self.destination_dirs
    }
}

/// Absolute paths of the sub-directories of `parent`, sorted
///
/// Files and symlinks are skipped.
fn inner_directories(parent: &Path) -> Result<Vec<PathBuf>> {
    let unreadable = |source: io::Error| ReconcileError::PathUnreadable {
        path: parent.to_path_buf(),
        source,
    };

    let parent_abs = std::path::absolute(parent).map_err(unreadable)?;

    let mut dirs = Vec::new();
    for entry in fs::read_dir(&parent_abs).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        if entry.file_type().map_err(unreadable)?.is_dir() {
            dirs.push(parent_abs.join(entry.file_name()));
        }
    }

    dirs.sort();
    Ok(dirs)
}
