//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `~/.config/diff-preview/config.toml` (or an explicit `--config` file)
//! 4. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::constants;
use crate::env::Env;
use crate::models::SnapshotLayout;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub git: GitConfig,
    pub viewer: ViewerConfig,
    pub snapshot: SnapshotConfig,
    pub workspace: WorkspaceConfig,
}

/// Version-control client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Executable name or path.
    pub command: String,
    /// Revision the "before" side is taken from.
    pub revision: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            command: "git".to_string(),
            revision: "HEAD".to_string(),
        }
    }
}

/// Directory-diff viewer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Executable name or path.
    pub command: String,
    /// Argument template; `{before}` / `{after}` are substituted. When unset,
    /// a preset for the command is used.
    pub args: Option<Vec<String>>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            command: default_viewer().to_string(),
            args: None,
        }
    }
}

#[cfg(windows)]
fn default_viewer() -> &'static str {
    "WinMergeU"
}

#[cfg(not(windows))]
fn default_viewer() -> &'static str {
    "meld"
}

/// Snapshot staging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Stage untracked files as additions.
    pub include_untracked: bool,
    pub layout: SnapshotLayout,
}

/// Scratch workspace settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Parent directory for the scratch root, instead of the temp-dir variables.
    pub dir: Option<PathBuf>,
    /// Snapshot directories older than this are swept.
    pub retention_hours: u64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            dir: None,
            retention_hours: constants::DEFAULT_RETENTION_HOURS,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads `path` if given, otherwise the global config file when it
    /// exists, then applies environment variable overrides. An explicit
    /// `path` that does not exist is an error.
    pub fn load(path: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        match path {
            Some(explicit) => config.merge(Self::load_file(explicit)?),
            None => {
                if let Some(global_path) = Self::global_config_path() {
                    if global_path.exists() {
                        config.merge(Self::load_file(&global_path)?);
                    }
                }
            }
        }

        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join(constants::CONFIG_FILENAME))
    }

    /// Merge another config into this one (other wins for non-default values).
    fn merge(&mut self, other: Config) {
        let default_git = GitConfig::default();
        if other.git.command != default_git.command {
            self.git.command = other.git.command;
        }
        if other.git.revision != default_git.revision {
            self.git.revision = other.git.revision;
        }

        if other.viewer.command != ViewerConfig::default().command {
            self.viewer.command = other.viewer.command;
        }
        if other.viewer.args.is_some() {
            self.viewer.args = other.viewer.args;
        }

        if other.snapshot.include_untracked {
            self.snapshot.include_untracked = true;
        }
        if other.snapshot.layout != SnapshotLayout::default() {
            self.snapshot.layout = other.snapshot.layout;
        }

        if other.workspace.dir.is_some() {
            self.workspace.dir = other.workspace.dir;
        }
        if other.workspace.retention_hours != WorkspaceConfig::default().retention_hours {
            self.workspace.retention_hours = other.workspace.retention_hours;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.non_empty(constants::ENV_GIT) {
            self.git.command = val;
        }
        if let Some(val) = env.non_empty(constants::ENV_VIEWER) {
            // A different viewer cannot reuse another program's template.
            if val != self.viewer.command {
                self.viewer.args = None;
            }
            self.viewer.command = val;
        }
        if let Some(val) = env.non_empty(constants::ENV_SCRATCH_DIR) {
            self.workspace.dir = Some(PathBuf::from(val));
        }
        if let Some(val) = env.non_empty(constants::ENV_INCLUDE_UNTRACKED) {
            match val.to_lowercase().as_str() {
                "false" | "0" | "no" | "off" => self.snapshot.include_untracked = false,
                "true" | "1" | "yes" | "on" => self.snapshot.include_untracked = true,
                _ => warn!(
                    "ignoring invalid {} value: {val}",
                    constants::ENV_INCLUDE_UNTRACKED
                ),
            }
        }
    }
}
