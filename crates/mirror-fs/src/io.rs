//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoff;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Retry behaviour for writes that race with other processes.
///
/// Editors and sync clients briefly hold files open while saving; renames
/// onto such files can fail transiently on some platforms.
#[derive(Debug, Clone, Copy)]
pub struct RobustnessConfig {
    /// Retry transient failures with exponential backoff
    pub retry_transient: bool,
    /// First retry delay
    pub initial_interval: Duration,
    /// Give up after this much total time
    pub max_elapsed: Duration,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            retry_transient: true,
            initial_interval: Duration::from_millis(25),
            max_elapsed: Duration::from_secs(2),
        }
    }
}

impl RobustnessConfig {
    /// Fail on the first error.
    pub fn no_retry() -> Self {
        Self {
            retry_transient: false,
            ..Self::default()
        }
    }

    fn policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_elapsed_time: Some(self.max_elapsed),
            ..ExponentialBackoff::default()
        }
    }
}

fn is_transient(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::PermissionDenied | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Acquires an advisory lock on the temp file while writing. Missing parent
/// directories are created.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], robustness: RobustnessConfig) -> Result<()> {
    if !robustness.retry_transient {
        return write_atomic_once(path, content);
    }

    backoff::retry(robustness.policy(), || {
        write_atomic_once(path, content).map_err(|e| match &e {
            Error::Io { source, .. } if is_transient(source) => {
                tracing::debug!(path = %path, error = %e, "Transient write failure, retrying");
                backoff::Error::transient(e)
            }
            _ => backoff::Error::permanent(e),
        })
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}

fn write_atomic_once(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let result = (|| {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

        temp_file
            .write_all(content)
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

        temp_file.unlock().map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

        fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Create a file with `content` only if nothing exists at `path` yet.
///
/// Returns `Ok(false)` without touching the file when it already exists.
/// The existence check and the creation are a single `create_new` open, so
/// a concurrently created file is never clobbered.
pub fn write_if_absent(path: &NormalizedPath, content: &[u8]) -> Result<bool> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&native_path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(Error::io(&native_path, e)),
    };

    file.write_all(content)
        .and_then(|_| file.sync_all())
        .map_err(|e| Error::io(&native_path, e))?;
    Ok(true)
}

/// Copy `source` to `dest` only if `dest` does not exist yet.
pub fn copy_if_absent(source: &Path, dest: &NormalizedPath) -> Result<bool> {
    if dest.to_native().exists() {
        return Ok(false);
    }
    let content = fs::read(source).map_err(|e| Error::io(source, e))?;
    write_if_absent(dest, &content)
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

/// Remove a file. A file that is already gone is not an error.
pub fn remove_file(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}
