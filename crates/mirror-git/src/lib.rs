//! Git publishing backend for vault-mirror
//!
//! [`VersionControl`] is the seam the publish step talks to;
//! [`GitRepository`] implements it in-process with libgit2.

pub mod auth;
pub mod error;
pub mod provider;
pub mod repository;

pub use error::{Error, Result};
pub use provider::{AheadBehind, MergeOutcome, VersionControl};
pub use repository::GitRepository;
