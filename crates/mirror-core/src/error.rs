//! Error types for mirror-core

use std::path::PathBuf;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parsed but is not usable
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The vault to mirror does not exist
    #[error("Source root is not a directory: {path}")]
    SourceRootMissing { path: PathBuf },

    /// A note is not valid UTF-8
    #[error("Not valid UTF-8: {path}")]
    InvalidUtf8 { path: PathBuf },

    /// A sync pass task panicked or was cancelled
    #[error("Sync pass aborted: {message}")]
    PassAborted { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// Content error from mirror-content
    #[error(transparent)]
    Content(#[from] mirror_content::Error),

    /// Git error from mirror-git
    #[error(transparent)]
    Git(#[from] mirror_git::Error),
}
