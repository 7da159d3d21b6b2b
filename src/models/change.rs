//! Change records produced from version-control status output.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The kind of pending change for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Tracked file with working-tree or staged edits.
    Modified,
    /// Newly added to the index.
    Added,
    /// Removed from the working tree or index.
    Deleted,
    /// Present on disk but never checked in.
    Untracked,
}

impl ChangeKind {
    /// Map a porcelain status code to a change kind.
    ///
    /// Only the four codes the previewer understands are accepted;
    /// anything else (renames, copies, mixed codes like `MM`) is `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(ChangeKind::Modified),
            "A" => Some(ChangeKind::Added),
            "D" => Some(ChangeKind::Deleted),
            "??" => Some(ChangeKind::Untracked),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Modified => write!(f, "modified"),
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Deleted => write!(f, "deleted"),
            ChangeKind::Untracked => write!(f, "untracked"),
        }
    }
}

/// One file with a pending difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// What happened to the file.
    pub kind: ChangeKind,
    /// Path as reported by the status query, relative to the repository root.
    pub path: String,
    /// Final path component, used as the file name inside a flat snapshot.
    pub display_name: String,
}

impl ChangeRecord {
    /// Build a record, deriving the display name from the path.
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        let path = path.into();
        let display_name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        Self {
            kind,
            path,
            display_name,
        }
    }

    /// Location of this record's file relative to a snapshot side directory.
    ///
    /// `Flat` places every file directly under the side directory by its
    /// display name. `Mirror` keeps the repository-relative directories,
    /// dropping any root, prefix, or `..` components.
    pub fn snapshot_relative_path(&self, layout: SnapshotLayout) -> PathBuf {
        match layout {
            SnapshotLayout::Flat => PathBuf::from(&self.display_name),
            SnapshotLayout::Mirror => {
                let mirrored: PathBuf = Path::new(&self.path)
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part),
                        _ => None,
                    })
                    .collect();
                if mirrored.as_os_str().is_empty() {
                    PathBuf::from(&self.display_name)
                } else {
                    mirrored
                }
            }
        }
    }
}

/// How changed files are arranged inside each snapshot side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotLayout {
    /// Every file sits directly under `before/` and `after/` by file name.
    /// Two changes with the same file name collide; the later one wins.
    #[default]
    Flat,
    /// Files keep their repository-relative directories.
    Mirror,
}

impl fmt::Display for SnapshotLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotLayout::Flat => write!(f, "flat"),
            SnapshotLayout::Mirror => write!(f, "mirror"),
        }
    }
}

impl std::str::FromStr for SnapshotLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" => Ok(SnapshotLayout::Flat),
            "mirror" => Ok(SnapshotLayout::Mirror),
            _ => Err(format!("unknown snapshot layout: {s} (expected flat or mirror)")),
        }
    }
}
