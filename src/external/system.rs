//! Subprocess-backed [`ExternalTools`]: the `git` CLI and a directory-diff viewer.
//!
//! Shells out via `tokio::process::Command`; every call is awaited to
//! completion before returning.

use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{short_name, ExternalTools, ToolError};
use crate::config::Config;
use crate::viewer::ViewerCommand;

/// Real tools, configured once from [`Config`].
#[derive(Debug, Clone)]
pub struct SystemTools {
    git: String,
    revision: String,
    viewer: ViewerCommand,
    require_viewer: bool,
}

impl SystemTools {
    /// Create tools from the loaded configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            git: config.git.command.clone(),
            revision: config.git.revision.clone(),
            viewer: ViewerCommand::from_config(&config.viewer),
            require_viewer: true,
        }
    }

    /// Skip the viewer during [`ExternalTools::verify`], for runs that never open it.
    pub fn viewer_optional(mut self) -> Self {
        self.require_viewer = false;
        self
    }

    /// Run `git` in `repo_root`, capturing stdout; non-zero exit is an error.
    async fn git_output(&self, repo_root: &Path, args: &[&str]) -> Result<Vec<u8>, ToolError> {
        info!("running: {} {:?}", short_name(&self.git), args);
        let output = tokio::process::Command::new(&self.git)
            .args(args)
            .current_dir(repo_root)
            .output()
            .await
            .map_err(|e| ToolError::Spawn {
                program: self.git.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: short_name(&self.git),
                args: args.join(" "),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("{} produced {} byte(s)", short_name(&self.git), output.stdout.len());
        Ok(output.stdout)
    }
}

/// Locate `name` on the search path, logging the outcome.
pub fn detect_executable(name: &str) -> Result<std::path::PathBuf, ToolError> {
    match which::which(name) {
        Ok(path) => {
            info!("'{name}' is '{}'", path.display());
            Ok(path)
        }
        Err(e) => Err(ToolError::NotFound {
            name: name.to_string(),
            source: e,
        }),
    }
}

#[async_trait]
impl ExternalTools for SystemTools {
    fn verify(&self) -> Result<(), ToolError> {
        detect_executable(&self.git)?;
        if self.require_viewer {
            detect_executable(&self.viewer.program)?;
        }
        Ok(())
    }

    async fn status_query(&self, repo_root: &Path, include_untracked: bool) -> Result<Vec<u8>, ToolError> {
        if include_untracked {
            self.git_output(repo_root, &["status", "--porcelain", "--untracked-files=all"])
                .await
        } else {
            self.git_output(repo_root, &["status", "--porcelain"]).await
        }
    }

    async fn show_at_revision(&self, repo_root: &Path, path: &str) -> Result<Vec<u8>, ToolError> {
        let object = format!("{}:{}", self.revision, path);
        self.git_output(repo_root, &["show", &object]).await
    }

    async fn launch_viewer(&self, before: &Path, after: &Path) -> Result<(), ToolError> {
        let args: Vec<OsString> = self.viewer.args_for(before, after);
        info!("running: {} {:?}", short_name(&self.viewer.program), args);

        let status = tokio::process::Command::new(&self.viewer.program)
            .args(&args)
            .status()
            .await
            .map_err(|e| ToolError::Spawn {
                program: self.viewer.program.clone(),
                source: e,
            })?;

        if !status.success() {
            return Err(ToolError::Failed {
                program: short_name(&self.viewer.program),
                args: args
                    .iter()
                    .map(|a| a.to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join(" "),
                status: status.to_string(),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}
