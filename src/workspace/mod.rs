//! Scratch workspace: a stable root holding one timestamped directory per run.
//!
//! Layout:
//! ```text
//! <temp>/diff-preview/
//!   2026-10-19_14_03_27/
//!     before/
//!     after/
//! ```
//! Run directories are never removed by the run that created them; the
//! retention sweep of a later run deletes them once they are old enough.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::WorkspaceConfig;
use crate::constants;
use crate::env::Env;

/// Errors from workspace housekeeping.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("none of the temp directory variables are set ({}); set one or configure [workspace] dir", .vars.join(", "))]
    EnvironmentMissing { vars: Vec<String> },

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl WorkspaceError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> Self + 'a {
        move |source| WorkspaceError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of a retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Directories deleted for exceeding the retention window.
    pub removed: Vec<PathBuf>,
    /// Directories left in place.
    pub kept: usize,
}

/// The scratch root and its retention policy.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    retention: Duration,
}

impl Workspace {
    /// Resolve the scratch root from configuration or the environment and create it.
    ///
    /// An explicit `[workspace] dir` wins; otherwise the platform temp-dir
    /// variables are tried in order. No other fallback is attempted.
    pub fn resolve(config: &WorkspaceConfig, env: &Env) -> Result<Self, WorkspaceError> {
        let parent = match &config.dir {
            Some(dir) => dir.clone(),
            None => {
                let (var, value) = env.first_of(constants::TEMP_DIR_VARS).ok_or_else(|| {
                    WorkspaceError::EnvironmentMissing {
                        vars: constants::TEMP_DIR_VARS.iter().map(|v| v.to_string()).collect(),
                    }
                })?;
                debug!("temp directory from {var}: {value}");
                PathBuf::from(value)
            }
        };

        let retention = Duration::from_secs(config.retention_hours.saturating_mul(60 * 60));
        Self::open(parent.join(constants::SCRATCH_DIR_NAME), retention)
    }

    /// Use `root` directly as the scratch root, creating it if absent.
    pub fn open(root: PathBuf, retention: Duration) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(&root).map_err(WorkspaceError::io("create scratch directory", &root))?;
        Ok(Self { root, retention })
    }

    /// The scratch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The retention window.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Delete run directories older than the retention window.
    pub fn sweep(&self) -> Result<SweepStats, WorkspaceError> {
        self.sweep_at(SystemTime::now())
    }

    /// [`sweep`](Self::sweep) against an explicit clock reading.
    ///
    /// Only immediate subdirectories are considered; files are left alone.
    /// A modification time in the future counts as age zero.
    pub fn sweep_at(&self, now: SystemTime) -> Result<SweepStats, WorkspaceError> {
        let mut stats = SweepStats::default();
        let entries =
            std::fs::read_dir(&self.root).map_err(WorkspaceError::io("read scratch directory", &self.root))?;

        for entry in entries {
            let entry = entry.map_err(WorkspaceError::io("read scratch directory", &self.root))?;
            let path = entry.path();
            let metadata = entry
                .metadata()
                .map_err(WorkspaceError::io("inspect", &path))?;
            if !metadata.is_dir() {
                continue;
            }

            let modified = metadata
                .modified()
                .map_err(WorkspaceError::io("read modification time of", &path))?;
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);

            if age > self.retention {
                info!("deleting {} because it is older than {}h", path.display(), self.retention.as_secs() / 3600);
                std::fs::remove_dir_all(&path).map_err(WorkspaceError::io("delete", &path))?;
                stats.removed.push(path);
            } else {
                debug!("keeping {} (age {}s)", path.display(), age.as_secs());
                stats.kept += 1;
            }
        }

        Ok(stats)
    }

    /// Create a fresh run directory named after the current local time.
    pub fn allocate(&self) -> Result<PathBuf, WorkspaceError> {
        self.allocate_at(Local::now())
    }

    /// [`allocate`](Self::allocate) for an explicit timestamp.
    ///
    /// If a directory with that name already exists, `-1`, `-2`, … is
    /// appended until an unused name is found.
    pub fn allocate_at(&self, now: DateTime<Local>) -> Result<PathBuf, WorkspaceError> {
        let base = run_dir_name(now);
        let mut suffix = 0u32;
        loop {
            let name = if suffix == 0 {
                base.clone()
            } else {
                format!("{base}-{suffix}")
            };
            let path = self.root.join(name);
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    debug!("allocated run directory {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(WorkspaceError::io("create run directory", &path)(e)),
            }
        }
    }
}

/// Sortable run directory name, e.g. `2026-10-19_14_03_27`.
pub fn run_dir_name(now: DateTime<Local>) -> String {
    now.format(constants::RUN_DIR_FORMAT).to_string()
}
