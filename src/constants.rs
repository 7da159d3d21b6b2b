//! App-wide constants.
//!
//! Centralises directory names, file formats, and environment variable
//! names so a rename only requires changing this file.

/// Directory name under `~/.config/` holding the global config.
pub const CONFIG_DIR: &str = "diff-preview";

/// Global config filename inside [`CONFIG_DIR`].
pub const CONFIG_FILENAME: &str = "config.toml";

/// Stable scratch directory name under the platform temp directory.
///
/// Kept constant across runs so stale snapshots can be found and swept.
pub const SCRATCH_DIR_NAME: &str = "diff-preview";

/// Version-control metadata folder marking a repository root.
pub const VCS_METADATA_DIR: &str = ".git";

/// Snapshot subdirectory holding last-committed content.
pub const BEFORE_DIR: &str = "before";

/// Snapshot subdirectory holding working-tree content.
pub const AFTER_DIR: &str = "after";

/// `chrono` format for per-run snapshot directory names (sortable).
pub const RUN_DIR_FORMAT: &str = "%Y-%m-%d_%H_%M_%S";

/// Default age after which a snapshot directory is swept.
pub const DEFAULT_RETENTION_HOURS: u64 = 24;

// ── Environment variable names ──────────────────────────────────────

pub const ENV_GIT: &str = "DIFF_PREVIEW_GIT";
pub const ENV_VIEWER: &str = "DIFF_PREVIEW_VIEWER";
pub const ENV_SCRATCH_DIR: &str = "DIFF_PREVIEW_SCRATCH_DIR";
pub const ENV_INCLUDE_UNTRACKED: &str = "DIFF_PREVIEW_INCLUDE_UNTRACKED";
pub const ENV_LOG: &str = "DIFF_PREVIEW_LOG";

/// Platform temp-directory variables, primary first.
#[cfg(windows)]
pub const TEMP_DIR_VARS: &[&str] = &["TEMP", "TMP"];

/// Platform temp-directory variables, primary first.
#[cfg(not(windows))]
pub const TEMP_DIR_VARS: &[&str] = &["TMPDIR", "TMP"];
