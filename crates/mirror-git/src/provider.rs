//! Version-control collaborator trait

use crate::Result;

/// Position of the local branch relative to its remote-tracking branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AheadBehind {
    /// Commits on the local branch missing from the remote
    pub ahead: usize,
    /// Commits on the remote missing from the local branch
    pub behind: usize,
    /// Whether the local branch has any commit yet
    pub has_local: bool,
    /// Whether the remote-tracking branch exists
    pub has_upstream: bool,
}

impl AheadBehind {
    /// Remote has new commits and the local branch has none of its own.
    pub fn is_behind_only(&self) -> bool {
        self.behind > 0 && self.ahead == 0
    }

    /// Both sides have commits the other lacks.
    pub fn is_diverged(&self) -> bool {
        self.behind > 0 && self.ahead > 0
    }

    /// The remote lacks local commits.
    pub fn needs_push(&self) -> bool {
        self.has_local && (self.ahead > 0 || !self.has_upstream)
    }
}

/// What a merge with the tracking branch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    UpToDate,
    FastForward,
    /// A merge commit was created
    Merged { commit: String },
}

/// Operations the publish step needs from version control.
///
/// Any failing call fails the whole publish attempt.
pub trait VersionControl {
    /// Update the remote-tracking branch from the remote.
    fn fetch(&self) -> Result<()>;

    /// Compare the local branch with its remote-tracking branch.
    fn ahead_behind(&self) -> Result<AheadBehind>;

    /// Move the local branch forward to the remote-tracking branch.
    ///
    /// Refuses to overwrite uncommitted local changes.
    fn fast_forward(&self) -> Result<MergeOutcome>;

    /// Merge the remote-tracking branch into the local branch.
    ///
    /// Fast-forwards when possible, otherwise creates a merge commit.
    /// Conflicts abort the merge and restore the previous state.
    fn merge_tracking_branch(&self) -> Result<MergeOutcome>;

    /// Stage every working-tree change, including deletions.
    ///
    /// Returns whether the index now differs from `HEAD`.
    fn stage_all(&self) -> Result<bool>;

    /// Commit the index. Returns the new commit id.
    fn commit(&self, message: &str) -> Result<String>;

    /// Push `branch` to the remote.
    fn push(&self, branch: &str) -> Result<()>;
}
