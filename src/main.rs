//! diff-preview: preview uncommitted changes in a directory-diff viewer.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use std::backtrace::BacktraceStatus;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::args::Cli;
use diff_preview::config::Config;
use diff_preview::constants;
use diff_preview::env::Env;
use diff_preview::external::SystemTools;
use diff_preview::preview::{PreviewError, PreviewOrchestrator};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        println!("Error: {err:#}");
        let backtrace = err.backtrace();
        if backtrace.status() == BacktraceStatus::Captured {
            println!("{backtrace}");
        }
        process::exit(1);
    }
}

/// Install the stderr log subscriber.
///
/// `DIFF_PREVIEW_LOG` takes a full filter directive; otherwise the level is
/// `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(constants::ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(format!("diff_preview={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let env = Env::real();

    let mut config = Config::load(cli.config.as_deref(), &env).map_err(PreviewError::from)?;
    cli.apply_to(&mut config);

    let start_dir = std::env::current_dir().context("failed to determine current directory")?;

    let orchestrator = if cli.no_viewer {
        let tools = Arc::new(SystemTools::new(&config).viewer_optional());
        PreviewOrchestrator::new(tools, &config, env).without_viewer()
    } else {
        PreviewOrchestrator::new(Arc::new(SystemTools::new(&config)), &config, env)
    };

    let outcome = orchestrator.run(&start_dir).await?;
    cli::print_outcome(&outcome);
    Ok(())
}
