//! Filesystem primitives for vault-mirror
//!
//! Provides forward-slash relative paths, atomic writes that never leave a
//! half-written artifact behind, create-once writes for protected files, and
//! format-agnostic configuration loading.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigFormat, ConfigStore};
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::{NormalizedPath, canonical_root};
