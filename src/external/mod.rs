//! External collaborators: the version-control client and the diff viewer.
//!
//! The rest of the crate talks to them only through [`ExternalTools`], so
//! parsing and snapshot policy can be exercised without spawning anything.

pub mod system;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use system::SystemTools;

/// Errors from external tool invocations.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("couldn't find '{name}' on the search path: {source}")]
    NotFound {
        name: String,
        source: which::Error,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} {args} failed ({status}): {stderr}")]
    Failed {
        program: String,
        args: String,
        status: String,
        stderr: String,
    },
}

/// Capability boundary for everything the previewer delegates to other programs.
#[async_trait]
pub trait ExternalTools: Send + Sync {
    /// Check that every required executable can be located.
    fn verify(&self) -> Result<(), ToolError>;

    /// Run the machine-readable status query in `repo_root` and return its raw output.
    ///
    /// With `include_untracked`, untracked directories are expanded into
    /// their individual files.
    async fn status_query(&self, repo_root: &Path, include_untracked: bool) -> Result<Vec<u8>, ToolError>;

    /// Return the last-committed bytes of the repository-relative `path`.
    async fn show_at_revision(&self, repo_root: &Path, path: &str) -> Result<Vec<u8>, ToolError>;

    /// Open the viewer on the two directories and wait until it is closed.
    async fn launch_viewer(&self, before: &Path, after: &Path) -> Result<(), ToolError>;
}

/// File name of `program` for log lines (`/usr/bin/git` → `git`).
pub(crate) fn short_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}
