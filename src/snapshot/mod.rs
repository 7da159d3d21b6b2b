//! Snapshot builder: stage before/after copies of every change.
//!
//! | kind                | `before/<name>`        | `after/<name>`         |
//! |---------------------|------------------------|------------------------|
//! | Added / Untracked   | empty placeholder      | working-tree bytes     |
//! | Deleted             | last-committed bytes   | empty placeholder      |
//! | Modified            | last-committed bytes   | working-tree bytes     |
//!
//! Placeholders are empty files rather than missing ones, so the viewer
//! always has a concrete pair to compare. All content is copied as raw
//! bytes. Any failure aborts the build.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::{AFTER_DIR, BEFORE_DIR};
use crate::external::{ExternalTools, ToolError};
use crate::models::{ChangeKind, ChangeRecord, SnapshotLayout};

/// Errors from snapshot staging.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to retrieve committed content of {path}: {source}")]
    History { path: String, source: ToolError },
}

fn io_err<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> SnapshotError + 'a {
    move |source| SnapshotError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}

/// The two mirrored directories of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    /// The run directory holding both sides.
    pub root: PathBuf,
    /// Last-committed side.
    pub before: PathBuf,
    /// Working-tree side.
    pub after: PathBuf,
}

impl SnapshotPair {
    /// Paths of the pair inside `run_dir` (nothing is created).
    pub fn in_dir(run_dir: &Path) -> Self {
        Self {
            root: run_dir.to_path_buf(),
            before: run_dir.join(BEFORE_DIR),
            after: run_dir.join(AFTER_DIR),
        }
    }
}

/// Stages change records into a [`SnapshotPair`].
pub struct SnapshotBuilder<'a> {
    tools: &'a dyn ExternalTools,
    repo_root: &'a Path,
    layout: SnapshotLayout,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(tools: &'a dyn ExternalTools, repo_root: &'a Path, layout: SnapshotLayout) -> Self {
        Self {
            tools,
            repo_root,
            layout,
        }
    }

    /// Create `before/` and `after/` in `run_dir` and stage every change.
    pub async fn build(&self, run_dir: &Path, changes: &[ChangeRecord]) -> Result<SnapshotPair, SnapshotError> {
        let pair = SnapshotPair::in_dir(run_dir);
        tokio::fs::create_dir_all(&pair.before)
            .await
            .map_err(io_err("create directory", &pair.before))?;
        tokio::fs::create_dir_all(&pair.after)
            .await
            .map_err(io_err("create directory", &pair.after))?;

        let mut placed: HashMap<PathBuf, &str> = HashMap::new();
        for change in changes {
            let relative = change.snapshot_relative_path(self.layout);
            if let Some(previous) = placed.insert(relative.clone(), &change.path) {
                warn!(
                    "'{}' and '{}' share the snapshot name '{}'; only the latter is shown",
                    previous,
                    change.path,
                    relative.display()
                );
            }
            self.stage(&pair, &relative, change).await?;
        }

        Ok(pair)
    }

    /// Write both sides for a single change.
    pub async fn stage(&self, pair: &SnapshotPair, relative: &Path, change: &ChangeRecord) -> Result<(), SnapshotError> {
        let before = pair.before.join(relative);
        let after = pair.after.join(relative);
        info!("staging {} {}", change.kind, change.path);

        match change.kind {
            ChangeKind::Added | ChangeKind::Untracked => {
                create_empty(&before).await?;
                self.copy_working(&change.path, &after).await?;
            }
            ChangeKind::Deleted => {
                self.write_committed(&change.path, &before).await?;
                create_empty(&after).await?;
            }
            ChangeKind::Modified => {
                self.write_committed(&change.path, &before).await?;
                self.copy_working(&change.path, &after).await?;
            }
        }
        Ok(())
    }

    /// Write the last-committed bytes of `path` to `dst` verbatim.
    async fn write_committed(&self, path: &str, dst: &Path) -> Result<(), SnapshotError> {
        let content = self
            .tools
            .show_at_revision(self.repo_root, path)
            .await
            .map_err(|e| SnapshotError::History {
                path: path.to_string(),
                source: e,
            })?;
        ensure_parent(dst).await?;
        debug!("{path} => {} ({} bytes)", dst.display(), content.len());
        tokio::fs::write(dst, &content)
            .await
            .map_err(io_err("write", dst))
    }

    /// Stream the working-tree file at `path` to `dst`.
    async fn copy_working(&self, path: &str, dst: &Path) -> Result<(), SnapshotError> {
        let src = self.repo_root.join(path);
        ensure_parent(dst).await?;
        let mut reader = tokio::fs::File::open(&src)
            .await
            .map_err(io_err("open", &src))?;
        let mut writer = tokio::fs::File::create(dst)
            .await
            .map_err(io_err("create", dst))?;
        let copied = tokio::io::copy(&mut reader, &mut writer)
            .await
            .map_err(io_err("copy", &src))?;
        debug!("{} => {} ({copied} bytes)", src.display(), dst.display());
        Ok(())
    }
}

async fn create_empty(path: &Path) -> Result<(), SnapshotError> {
    ensure_parent(path).await?;
    tokio::fs::File::create(path)
        .await
        .map_err(io_err("create", path))?;
    Ok(())
}

async fn ensure_parent(path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_err("create directory", parent))?;
    }
    Ok(())
}
