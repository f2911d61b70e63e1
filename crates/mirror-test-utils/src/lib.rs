//! Shared test utilities for the vault-mirror workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`] — working repositories and bare remotes driven through the `git` CLI
//! - [`vault`] — [`vault::TestVault`] builder for source vaults and content trees

pub mod git;
pub mod vault;
