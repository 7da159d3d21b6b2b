//! CLI argument parsing and terminal reporting.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use colored::Colorize;

use diff_preview::preview::PreviewOutcome;

/// Print the user-facing summary of a finished run to stdout.
pub fn print_outcome(outcome: &PreviewOutcome) {
    match outcome {
        PreviewOutcome::NoChanges { repo_root } => {
            println!(
                "  {} No changes to preview in {}",
                "✔".green().bold(),
                repo_root.display().to_string().dimmed(),
            );
        }
        PreviewOutcome::Staged {
            snapshot,
            changes,
            viewer_launched,
            ..
        } => {
            println!(
                "  {} {} change(s) staged in {}",
                "✔".green().bold(),
                changes.to_string().bold(),
                snapshot.root.display().to_string().cyan(),
            );
            if !viewer_launched {
                println!("         {}  {}", "before:".cyan(), snapshot.before.display());
                println!("         {}   {}", "after:".cyan(), snapshot.after.display());
            }
        }
    }
}
