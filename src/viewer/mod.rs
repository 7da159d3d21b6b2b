//! Diff viewer command-line construction.
//!
//! The viewer is configured by program name plus an optional argument
//! template. Without a template, arguments come from a preset keyed on the
//! program's file stem, followed by the two snapshot directories.

use std::ffi::OsString;
use std::path::Path;

use crate::config::ViewerConfig;

/// Placeholder replaced by the `before/` directory.
pub const BEFORE_PLACEHOLDER: &str = "{before}";

/// Placeholder replaced by the `after/` directory.
pub const AFTER_PLACEHOLDER: &str = "{after}";

/// A resolved viewer invocation template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerCommand {
    /// Executable name or path.
    pub program: String,
    template: Vec<String>,
}

impl ViewerCommand {
    /// Build from configuration, falling back to the program's preset.
    pub fn from_config(config: &ViewerConfig) -> Self {
        let template = match &config.args {
            Some(args) => args.clone(),
            None => preset_args(&config.command),
        };
        Self {
            program: config.command.clone(),
            template,
        }
    }

    /// Concrete arguments for comparing `before` against `after`.
    ///
    /// If the template never mentions a placeholder, both directories are
    /// appended in order.
    pub fn args_for(&self, before: &Path, after: &Path) -> Vec<OsString> {
        let mentions_dirs = self
            .template
            .iter()
            .any(|a| a.contains(BEFORE_PLACEHOLDER) || a.contains(AFTER_PLACEHOLDER));

        let mut args: Vec<OsString> = self
            .template
            .iter()
            .map(|arg| substitute(arg, before, after))
            .collect();

        if !mentions_dirs {
            args.push(before.as_os_str().to_owned());
            args.push(after.as_os_str().to_owned());
        }
        args
    }
}

/// Preset arguments for well-known viewers.
///
/// WinMerge: `/u` keeps the paths out of the recently-used list, `/wl` and
/// `/wr` open both sides read-only, `/r` compares recursively. Other viewers
/// recurse into directories by default and get no extra flags.
pub fn preset_args(program: &str) -> Vec<String> {
    // Either separator, so Windows paths in a shared config still match.
    let file = program.rsplit(['/', '\\']).next().unwrap_or(program);
    let stem = file
        .rsplit_once('.')
        .map_or(file, |(stem, _ext)| stem)
        .to_lowercase();

    match stem.as_str() {
        "winmergeu" | "winmerge" => ["/u", "/wl", "/wr", "/r"]
            .into_iter()
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn substitute(arg: &str, before: &Path, after: &Path) -> OsString {
    // Whole-argument placeholders keep non-UTF-8 paths intact.
    if arg == BEFORE_PLACEHOLDER {
        return before.as_os_str().to_owned();
    }
    if arg == AFTER_PLACEHOLDER {
        return after.as_os_str().to_owned();
    }
    arg.replace(BEFORE_PLACEHOLDER, &before.to_string_lossy())
        .replace(AFTER_PLACEHOLDER, &after.to_string_lossy())
        .into()
}
