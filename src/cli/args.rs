//! Clap argument types.
//!
//! Every flag is optional; a bare invocation previews the current
//! repository with the configured defaults.

use clap::Parser;
use std::path::PathBuf;

use diff_preview::config::Config;
use diff_preview::models::SnapshotLayout;

/// Preview uncommitted changes in a directory-diff viewer.
#[derive(Parser, Debug)]
#[command(
    name = "diff-preview",
    version,
    about,
    after_help = "On failure the error is printed to stdout and the exit status is 1.\n\
                  Set RUST_BACKTRACE=1 (or RUST_LIB_BACKTRACE=1) to also print a backtrace."
)]
pub struct Cli {
    /// Config file to use instead of the global one.
    #[arg(long, env = "DIFF_PREVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also stage untracked files (shown as additions).
    #[arg(long, default_value_t = false)]
    pub include_untracked: bool,

    /// Snapshot layout: `flat` (by file name) or `mirror` (repository paths).
    #[arg(long)]
    pub layout: Option<SnapshotLayout>,

    /// Stage the snapshot and print its location without opening the viewer.
    #[arg(long, default_value_t = false)]
    pub no_viewer: bool,

    /// Show debug logging.
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Apply CLI flags on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if self.include_untracked {
            config.snapshot.include_untracked = true;
        }
        if let Some(layout) = self.layout {
            config.snapshot.layout = layout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_documents_backtrace_opt_in() {
        use clap::CommandFactory;

        let help = Cli::command().render_help().to_string();
        assert!(help.contains("RUST_BACKTRACE=1"), "got: {help}");
    }

    #[test]
    fn bare_invocation_parses() {
        let cli = Cli::try_parse_from(["diff-preview"]).unwrap();
        assert!(!cli.include_untracked);
        assert!(!cli.no_viewer);
        assert!(!cli.verbose);
        assert_eq!(cli.layout, None);
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "diff-preview",
            "--include-untracked",
            "--layout",
            "mirror",
            "--no-viewer",
            "-v",
        ])
        .unwrap();
        assert!(cli.include_untracked);
        assert!(cli.no_viewer);
        assert!(cli.verbose);
        assert_eq!(cli.layout, Some(SnapshotLayout::Mirror));
    }

    #[test]
    fn invalid_layout_is_rejected() {
        assert!(Cli::try_parse_from(["diff-preview", "--layout", "tree"]).is_err());
    }

    #[test]
    fn positional_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["diff-preview", "extra"]).is_err());
    }

    #[test]
    fn apply_to_overrides_config() {
        let cli = Cli::try_parse_from(["diff-preview", "--include-untracked", "--layout", "mirror"]).unwrap();
        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert!(config.snapshot.include_untracked);
        assert_eq!(config.snapshot.layout, SnapshotLayout::Mirror);
    }

    #[test]
    fn apply_to_without_flags_keeps_config() {
        let cli = Cli::try_parse_from(["diff-preview"]).unwrap();
        let mut config = Config::default();
        config.snapshot.include_untracked = true;
        config.snapshot.layout = SnapshotLayout::Mirror;
        cli.apply_to(&mut config);
        assert!(config.snapshot.include_untracked);
        assert_eq!(config.snapshot.layout, SnapshotLayout::Mirror);
    }
}
