//! Preview orchestrator.
//!
//! One linear pass per invocation:
//! detect tools → init workspace (sweep) → locate repo root → query changes
//! → (stop if none) → build snapshot → launch viewer.
//!
//! Every step returns its error instead of exiting; the binary turns the
//! first failure into a diagnostic and a non-zero exit status.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::env::Env;
use crate::external::{ExternalTools, ToolError};
use crate::repo::{self, RepoError};
use crate::snapshot::{SnapshotBuilder, SnapshotError, SnapshotPair};
use crate::status::{self, StatusError};
use crate::workspace::{Workspace, WorkspaceError};

/// Terminal failures of a preview run.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// A required executable is not on the search path.
    #[error(transparent)]
    ToolNotFound(ToolError),

    /// No usable temp-directory configuration.
    #[error(transparent)]
    EnvironmentMissing(WorkspaceError),

    /// Status output could not be parsed.
    #[error(transparent)]
    Parse(#[from] StatusError),

    /// A filesystem operation failed.
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// An external command failed to start or exited unsuccessfully.
    #[error(transparent)]
    Subprocess(ToolError),

    /// The starting directory is not inside a repository.
    #[error(transparent)]
    RepoNotFound(RepoError),

    /// The configuration file could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ToolError> for PreviewError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound { .. } => PreviewError::ToolNotFound(err),
            _ => PreviewError::Subprocess(err),
        }
    }
}

impl From<WorkspaceError> for PreviewError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::EnvironmentMissing { .. } => PreviewError::EnvironmentMissing(err),
            WorkspaceError::Io { action, path, source } => PreviewError::Io { action, path, source },
        }
    }
}

impl From<RepoError> for PreviewError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { .. } => PreviewError::RepoNotFound(err),
            RepoError::ReadDir { path, source } => PreviewError::Io {
                action: "read directory",
                path,
                source,
            },
        }
    }
}

impl From<SnapshotError> for PreviewError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Io { action, path, source } => PreviewError::Io { action, path, source },
            SnapshotError::History { source, .. } => source.into(),
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// The status query reported nothing to stage.
    NoChanges { repo_root: PathBuf },
    /// A snapshot was staged (and shown, if the viewer was requested).
    Staged {
        repo_root: PathBuf,
        snapshot: SnapshotPair,
        changes: usize,
        viewer_launched: bool,
    },
}

/// Drives one end-to-end preview run.
pub struct PreviewOrchestrator {
    tools: Arc<dyn ExternalTools>,
    config: Config,
    env: Env,
    launch_viewer: bool,
}

impl PreviewOrchestrator {
    pub fn new(tools: Arc<dyn ExternalTools>, config: &Config, env: Env) -> Self {
        Self {
            tools,
            config: config.clone(),
            env,
            launch_viewer: true,
        }
    }

    /// Stage the snapshot but skip opening the viewer.
    pub fn without_viewer(mut self) -> Self {
        self.launch_viewer = false;
        self
    }

    /// Run the full pipeline starting from `start_dir`.
    pub async fn run(&self, start_dir: &Path) -> Result<PreviewOutcome, PreviewError> {
        self.tools.verify()?;

        let workspace = Workspace::resolve(&self.config.workspace, &self.env)?;
        info!(
            "temp dir: {} (keeping snapshots for {}h)",
            workspace.root().display(),
            workspace.retention().as_secs() / 3600
        );
        let swept = workspace.sweep()?;
        if !swept.removed.is_empty() {
            info!("removed {} old snapshot(s)", swept.removed.len());
        }

        let repo_root = repo::find_repo_root(start_dir)?;

        let output = self
            .tools
            .status_query(&repo_root, self.config.snapshot.include_untracked)
            .await?;
        let changes = status::parse_status(&output, self.config.snapshot.include_untracked)?;
        if changes.is_empty() {
            return Ok(PreviewOutcome::NoChanges { repo_root });
        }
        info!("{} change(s)", changes.len());

        let run_dir = workspace.allocate()?;
        let snapshot = SnapshotBuilder::new(self.tools.as_ref(), &repo_root, self.config.snapshot.layout)
            .build(&run_dir, &changes)
            .await?;

        if self.launch_viewer {
            self.tools
                .launch_viewer(&snapshot.before, &snapshot.after)
                .await?;
        }

        Ok(PreviewOutcome::Staged {
            repo_root,
            snapshot,
            changes: changes.len(),
            viewer_launched: self.launch_viewer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use crate::constants;

    /// Scripted tools recording every call.
    struct ScriptedTools {
        missing: Option<&'static str>,
        status: Vec<u8>,
        committed: HashMap<String, Vec<u8>>,
        viewer_calls: Mutex<Vec<(PathBuf, PathBuf)>>,
        status_calls: Mutex<Vec<(PathBuf, bool)>>,
    }

    impl ScriptedTools {
        fn new(status: &str) -> Self {
            Self {
                missing: None,
                status: status.as_bytes().to_vec(),
                committed: HashMap::new(),
                viewer_calls: Mutex::new(Vec::new()),
                status_calls: Mutex::new(Vec::new()),
            }
        }

        fn with_committed(mut self, path: &str, content: &[u8]) -> Self {
            self.committed.insert(path.to_string(), content.to_vec());
            self
        }
    }

    #[async_trait]
    impl ExternalTools for ScriptedTools {
        fn verify(&self) -> Result<(), ToolError> {
            match self.missing {
                Some(name) => Err(ToolError::NotFound {
                    name: name.to_string(),
                    source: which::Error::CannotFindBinaryPath,
                }),
                None => Ok(()),
            }
        }

        async fn status_query(&self, repo_root: &Path, include_untracked: bool) -> Result<Vec<u8>, ToolError> {
            self.status_calls
                .lock()
                .unwrap()
                .push((repo_root.to_path_buf(), include_untracked));
            Ok(self.status.clone())
        }

        async fn show_at_revision(&self, _repo_root: &Path, path: &str) -> Result<Vec<u8>, ToolError> {
            self.committed.get(path).cloned().ok_or_else(|| ToolError::Failed {
                program: "git".into(),
                args: format!("show HEAD:{path}"),
                status: "exit status: 128".into(),
                stderr: String::new(),
            })
        }

        async fn launch_viewer(&self, before: &Path, after: &Path) -> Result<(), ToolError> {
            self.viewer_calls
                .lock()
                .unwrap()
                .push((before.to_path_buf(), after.to_path_buf()));
            Ok(())
        }
    }

    struct Fixture {
        repo: tempfile::TempDir,
        temp: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let repo = tempfile::tempdir().unwrap();
            std::fs::create_dir(repo.path().join(".git")).unwrap();
            Self {
                repo,
                temp: tempfile::tempdir().unwrap(),
            }
        }

        fn env(&self) -> Env {
            Env::mock([(constants::TEMP_DIR_VARS[0], self.temp.path().to_str().unwrap())])
        }

        fn scratch(&self) -> PathBuf {
            self.temp.path().join(constants::SCRATCH_DIR_NAME)
        }

        fn write(&self, rel: &str, content: &[u8]) {
            let p = self.repo.path().join(rel);
            std::fs::create_dir_all(p.parent().unwrap()).unwrap();
            std::fs::write(p, content).unwrap();
        }
    }

    #[tokio::test]
    async fn no_changes_creates_nothing_and_skips_viewer() {
        let fx = Fixture::new();
        let tools = Arc::new(ScriptedTools::new(""));
        let orch = PreviewOrchestrator::new(tools.clone(), &Config::default(), fx.env());

        let outcome = orch.run(fx.repo.path()).await.unwrap();

        assert_eq!(
            outcome,
            PreviewOutcome::NoChanges {
                repo_root: fx.repo.path().to_path_buf()
            }
        );
        assert_eq!(std::fs::read_dir(fx.scratch()).unwrap().count(), 0);
        assert!(tools.viewer_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_untracked_changes_count_as_none() {
        let fx = Fixture::new();
        let tools = Arc::new(ScriptedTools::new("?? scratch.txt\n"));
        let orch = PreviewOrchestrator::new(tools.clone(), &Config::default(), fx.env());

        let outcome = orch.run(fx.repo.path()).await.unwrap();
        assert!(matches!(outcome, PreviewOutcome::NoChanges { .. }));
    }

    #[tokio::test]
    async fn full_run_stages_and_opens_viewer() {
        let fx = Fixture::new();
        fx.write("src/a.go", b"a-new");
        fx.write("src/b.go", b"b-new");
        fx.write("src/junk.go", b"junk");
        let tools = Arc::new(
            ScriptedTools::new("M src/a.go\nA src/b.go\nD src/c.go\n??  src/junk.go\n")
                .with_committed("src/a.go", b"a-old")
                .with_committed("src/c.go", b"c-old"),
        );
        let orch = PreviewOrchestrator::new(tools.clone(), &Config::default(), fx.env());

        let nested = fx.repo.path().join("src");
        let outcome = orch.run(&nested).await.unwrap();

        let PreviewOutcome::Staged { repo_root, snapshot, changes, viewer_launched } = outcome else {
            panic!("expected staged outcome");
        };
        assert_eq!(repo_root, fx.repo.path());
        assert_eq!(changes, 3);
        assert!(viewer_launched);
        assert!(snapshot.root.starts_with(fx.scratch()));

        assert_eq!(std::fs::read(snapshot.before.join("a.go")).unwrap(), b"a-old");
        assert_eq!(std::fs::read(snapshot.after.join("a.go")).unwrap(), b"a-new");
        assert_eq!(std::fs::read(snapshot.before.join("b.go")).unwrap(), b"");
        assert_eq!(std::fs::read(snapshot.after.join("c.go")).unwrap(), b"");
        assert!(!snapshot.after.join("junk.go").exists());

        let calls = tools.viewer_calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(snapshot.before.clone(), snapshot.after.clone())]);
        let status_calls = tools.status_calls.lock().unwrap();
        assert_eq!(status_calls.as_slice(), &[(fx.repo.path().to_path_buf(), false)]);
    }

    #[tokio::test]
    async fn include_untracked_stages_them_as_added() {
        let fx = Fixture::new();
        fx.write("notes.md", b"draft");
        let tools = Arc::new(ScriptedTools::new("?? notes.md\n"));
        let mut config = Config::default();
        config.snapshot.include_untracked = true;
        let orch = PreviewOrchestrator::new(tools.clone(), &config, fx.env()).without_viewer();

        let outcome = orch.run(fx.repo.path()).await.unwrap();
        let PreviewOutcome::Staged { snapshot, viewer_launched, .. } = outcome else {
            panic!("expected staged outcome");
        };
        assert!(!viewer_launched);
        assert_eq!(std::fs::read(snapshot.before.join("notes.md")).unwrap(), b"");
        assert_eq!(std::fs::read(snapshot.after.join("notes.md")).unwrap(), b"draft");
        assert!(tools.viewer_calls.lock().unwrap().is_empty());
        assert!(tools.status_calls.lock().unwrap()[0].1);
    }

    #[tokio::test]
    async fn parse_error_aborts_before_staging() {
        let fx = Fixture::new();
        fx.write("a.txt", b"x");
        let tools = Arc::new(ScriptedTools::new("M a.txt\nR a.txt -> b.txt\n").with_committed("a.txt", b"y"));
        let orch = PreviewOrchestrator::new(tools.clone(), &Config::default(), fx.env());

        let err = orch.run(fx.repo.path()).await.unwrap_err();
        assert!(matches!(err, PreviewError::Parse(_)), "got: {err}");
        assert_eq!(std::fs::read_dir(fx.scratch()).unwrap().count(), 0);
        assert!(tools.viewer_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_tool_aborts_before_side_effects() {
        let fx = Fixture::new();
        let mut scripted = ScriptedTools::new("M a.txt\n");
        scripted.missing = Some("WinMergeU");
        let orch = PreviewOrchestrator::new(Arc::new(scripted), &Config::default(), fx.env());

        let err = orch.run(fx.repo.path()).await.unwrap_err();
        assert!(matches!(err, PreviewError::ToolNotFound(_)), "got: {err}");
        assert!(err.to_string().contains("WinMergeU"));
        assert!(!fx.scratch().exists());
    }

    #[tokio::test]
    async fn missing_temp_env_is_fatal() {
        let fx = Fixture::new();
        let orch = PreviewOrchestrator::new(Arc::new(ScriptedTools::new("")), &Config::default(), Env::empty());

        let err = orch.run(fx.repo.path()).await.unwrap_err();
        assert!(matches!(err, PreviewError::EnvironmentMissing(_)), "got: {err}");
    }

    #[tokio::test]
    async fn outside_repository_is_fatal() {
        let fx = Fixture::new();
        let outside = tempfile::tempdir().unwrap();
        let orch = PreviewOrchestrator::new(Arc::new(ScriptedTools::new("")), &Config::default(), fx.env());

        let err = orch.run(outside.path()).await.unwrap_err();
        assert!(matches!(err, PreviewError::RepoNotFound(_)), "got: {err}");
    }

    #[tokio::test]
    async fn history_failure_maps_to_subprocess_error() {
        let fx = Fixture::new();
        fx.write("a.txt", b"x");
        let orch = PreviewOrchestrator::new(Arc::new(ScriptedTools::new("M a.txt\n")), &Config::default(), fx.env());

        let err = orch.run(fx.repo.path()).await.unwrap_err();
        assert!(matches!(err, PreviewError::Subprocess(_)), "got: {err}");
    }

    #[test]
    fn unreadable_config_maps_to_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");

        let err: PreviewError = Config::load(Some(missing.as_path()), &Env::empty()).unwrap_err().into();
        assert!(matches!(err, PreviewError::Config(ConfigError::ReadFile { .. })), "got: {err}");
        assert!(err.to_string().contains("missing.toml"));
    }

    #[tokio::test]
    async fn old_snapshots_are_swept_at_start() {
        let fx = Fixture::new();
        let stale = fx.scratch().join("2000-01-01_00_00_00");
        std::fs::create_dir_all(&stale).unwrap();
        let long_ago = std::time::SystemTime::now() - std::time::Duration::from_secs(3 * 24 * 3600);
        filetime::set_file_mtime(&stale, filetime::FileTime::from_system_time(long_ago)).unwrap();

        let orch = PreviewOrchestrator::new(Arc::new(ScriptedTools::new("")), &Config::default(), fx.env());
        orch.run(fx.repo.path()).await.unwrap();

        assert!(!stale.exists());
    }
}
