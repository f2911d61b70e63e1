//! Per-pass reconciliation report

use std::collections::BTreeSet;

use mirror_fs::NormalizedPath;
use serde::Serialize;

/// A source file that could not be processed this pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// Source-relative path (or the walker's path for walk errors)
    pub path: String,
    pub message: String,
}

/// Two sources that normalize to the same destination; the later one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub destination: String,
    pub replaced: String,
    pub winner: String,
}

/// Outcome of one reconciliation pass.
///
/// Paths are relative to the destination root unless noted otherwise.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Nothing on disk was modified
    pub dry_run: bool,
    pub folders_created: Vec<String>,
    pub written: Vec<String>,
    pub indexes_created: Vec<String>,
    /// Source `_index.md` markers copied into the destination
    pub markers_copied: Vec<String>,
    pub deleted: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub collisions: Vec<Collision>,
    /// Every destination path accounted for by this pass
    #[serde(skip)]
    pub produced: BTreeSet<NormalizedPath>,
}

impl ReconcileReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Whether every eligible source was processed.
    pub fn is_success(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Whether the destination tree changed structurally (new folders,
    /// indexes, or deletions). Rewritten documents are not counted since
    /// every pass rewrites them.
    pub fn changed_structure(&self) -> bool {
        !(self.folders_created.is_empty()
            && self.indexes_created.is_empty()
            && self.markers_copied.is_empty()
            && self.deleted.is_empty())
    }

    /// Human-readable list of actions, prefixed with `[dry-run]` when
    /// nothing was modified.
    pub fn actions(&self) -> Vec<String> {
        let (prefix, create, write, copy, delete) = if self.dry_run {
            (
                "[dry-run] ",
                "Would create",
                "Would write",
                "Would copy",
                "Would delete",
            )
        } else {
            ("", "Created", "Wrote", "Copied", "Deleted")
        };

        let mut actions = Vec::new();
        for path in &self.folders_created {
            actions.push(format!("{prefix}{create} folder {path}"));
        }
        for path in &self.markers_copied {
            actions.push(format!("{prefix}{copy} index marker {path}"));
        }
        for path in &self.indexes_created {
            actions.push(format!("{prefix}{create} index {path}"));
        }
        for path in &self.written {
            actions.push(format!("{prefix}{write} {path}"));
        }
        for path in &self.deleted {
            actions.push(format!("{prefix}{delete} {path}"));
        }
        actions
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} written, {} indexes, {} deleted, {} skipped",
            self.written.len(),
            self.indexes_created.len() + self.markers_copied.len(),
            self.deleted.len(),
            self.skipped.len()
        )
    }
}
