//! Error types for mirror-git

use std::path::PathBuf;

/// Result type for mirror-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] mirror_fs::Error),

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Fetch failed: {message}")]
    FetchFailed { message: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Push of {reference} rejected by remote: {message}")]
    PushRejected { reference: String, message: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },

    #[error("Merge conflict: {message}")]
    MergeConflict { message: String },

    #[error("Checked out branch is '{actual}', expected '{expected}'")]
    WrongBranch { expected: String, actual: String },
}
