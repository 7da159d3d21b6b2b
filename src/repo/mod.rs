//! Repository root discovery.
//!
//! Walks upward from a starting directory until one contains a `.git`
//! entry. Status paths are relative to that directory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::constants::VCS_METADATA_DIR;

/// Errors from repository discovery.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("no {VCS_METADATA_DIR} directory found in {start} or any parent directory")]
    NotFound { start: PathBuf },

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Find the closest ancestor of `start` (inclusive) holding version-control metadata.
pub fn find_repo_root(start: &Path) -> Result<PathBuf, RepoError> {
    for dir in start.ancestors() {
        if has_vcs_metadata(dir)? {
            if dir != start {
                info!("repository root: '{}'", dir.display());
            }
            return Ok(dir.to_path_buf());
        }
        debug!("no {VCS_METADATA_DIR} in '{}'", dir.display());
    }
    Err(RepoError::NotFound {
        start: start.to_path_buf(),
    })
}

/// Whether `dir` directly contains a `.git` entry (matched case-insensitively).
///
/// A `.git` directory is a regular checkout; a `.git` file points elsewhere
/// (linked worktrees, submodules) and counts as well.
pub fn has_vcs_metadata(dir: &Path) -> Result<bool, RepoError> {
    let entries = std::fs::read_dir(dir).map_err(|e| RepoError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| RepoError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if entry.file_name().to_string_lossy().eq_ignore_ascii_case(VCS_METADATA_DIR) {
            let is_candidate = entry
                .file_type()
                .map(|t| t.is_dir() || t.is_file())
                .unwrap_or(false);
            return Ok(is_candidate);
        }
    }
    Ok(false)
}
