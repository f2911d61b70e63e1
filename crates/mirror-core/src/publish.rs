//! Publish gate: commit the destination tree and push it upstream

use std::collections::BTreeSet;
use std::path::Path;

use mirror_fs::NormalizedPath;
use mirror_git::{MergeOutcome, VersionControl};
use serde::Serialize;

use crate::Result;

/// First line of every automatic commit message.
pub const COMMIT_HEADLINE: &str = "Auto-commit from vault-mirror - Updated files:";

/// What a publish attempt did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// Local branch was fast-forwarded to upstream
    pub fast_forwarded: bool,
    /// Merge commit joining diverged histories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_commit: Option<String>,
    /// Commit holding the staged changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub pushed: bool,
}

impl PublishOutcome {
    /// Whether the attempt changed anything locally or remotely.
    pub fn is_noop(&self) -> bool {
        !self.fast_forwarded && self.merge_commit.is_none() && self.commit.is_none() && !self.pushed
    }
}

/// Express changed paths relative to the source root, sorted.
///
/// Paths outside the root are kept as given.
pub fn summarize_changes<'a, I>(source_root: &Path, changes: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Path>,
{
    changes
        .into_iter()
        .map(|path| match NormalizedPath::relative(source_root, path) {
            Some(relative) if !relative.is_empty() => relative.to_string(),
            _ => NormalizedPath::new(path).to_string(),
        })
        .collect()
}

/// Build the automatic commit message: the headline, then one path per line.
pub fn commit_message(changed: &BTreeSet<String>) -> String {
    let mut message = String::from(COMMIT_HEADLINE);
    for path in changed {
        message.push('\n');
        message.push_str(path);
    }
    message
}

/// Stages, commits, merges, and pushes through a [`VersionControl`] backend.
pub struct Publisher<V> {
    vcs: V,
    branch: String,
}

impl<V: VersionControl> Publisher<V> {
    pub fn new(vcs: V, branch: &str) -> Self {
        Self {
            vcs,
            branch: branch.to_string(),
        }
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Run one publish attempt.
    ///
    /// Any backend failure aborts the attempt; files already written to the
    /// destination stay on disk and go out with the next publish.
    pub fn publish(&self, changed: &BTreeSet<String>) -> Result<PublishOutcome> {
        let mut outcome = PublishOutcome::default();

        self.vcs.fetch()?;
        if self.vcs.ahead_behind()?.is_behind_only() {
            self.vcs.fast_forward()?;
            outcome.fast_forwarded = true;
        }

        if self.vcs.stage_all()? {
            outcome.commit = Some(self.vcs.commit(&commit_message(changed))?);
        } else {
            tracing::debug!("Nothing staged, skipping commit");
        }

        if self.vcs.ahead_behind()?.is_diverged() {
            match self.vcs.merge_tracking_branch()? {
                MergeOutcome::Merged { commit } => outcome.merge_commit = Some(commit),
                MergeOutcome::FastForward => outcome.fast_forwarded = true,
                MergeOutcome::UpToDate => {}
            }
        }

        if self.vcs.ahead_behind()?.needs_push() {
            self.vcs.push(&self.branch)?;
            outcome.pushed = true;
        }

        if outcome.is_noop() {
            tracing::info!("Publish: already up to date");
        } else {
            tracing::info!(
                commit = outcome.commit.as_deref().unwrap_or("-"),
                pushed = outcome.pushed,
                "Publish complete"
            );
        }
        Ok(outcome)
    }
}
