//! Normalized path handling for cross-platform compatibility

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Artifact identities (source-relative and destination-relative paths) are
/// stored in this form so that sets of paths compare equal across platforms.
/// Conversion to a platform-native path only happens at I/O boundaries.
///
/// The empty path denotes "the root itself" when used relative to a root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes and collapses repeated
    /// separators (a leading `//` network prefix is kept).
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self::from_slashed(&path_str.replace('\\', "/"))
    }

    fn from_slashed(raw: &str) -> Self {
        let (prefix, rest) = if raw.starts_with("//") && !raw.starts_with("///") {
            ("//", &raw[2..])
        } else if raw.starts_with('/') {
            ("/", raw.trim_start_matches('/'))
        } else {
            ("", raw)
        };

        let body = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        Self {
            inner: format!("{prefix}{body}"),
        }
    }

    /// The empty relative path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a relative path from `path` as seen from `base`.
    ///
    /// Returns `None` when `path` is not located under `base`.
    pub fn relative(base: &Path, path: &Path) -> Option<Self> {
        let stripped = path.strip_prefix(base).ok()?;
        let mut segments = Vec::new();
        for component in stripped.components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(Self::from_segments(segments))
    }

    /// Build a relative path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self { inner: joined }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether this is the empty relative path.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Resolve this relative path against a native root.
    pub fn under(&self, root: &Path) -> PathBuf {
        let mut native = root.to_path_buf();
        for segment in self.segments() {
            native.push(segment);
        }
        native
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        if self.inner.is_empty() {
            return Self::from_slashed(&segment_normalized);
        }
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self::from_slashed(&joined)
    }

    /// Get the parent directory.
    ///
    /// The parent of a single relative segment is the empty root path.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.rfind('/') {
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            None => Some(Self::root()),
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Get the file name without its extension.
    pub fn file_stem(&self) -> Option<&str> {
        self.file_name().map(|name| match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        })
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Canonicalize a configured root directory.
///
/// Relative paths resolve against the current directory. A tail that does
/// not exist yet (a content root before its first pass) is appended to the
/// canonical form of its deepest existing ancestor.
///
/// Uses `dunce` so Windows roots do not turn into `\\?\` verbatim paths,
/// which would break prefix comparisons against watcher event paths.
pub fn canonical_root(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| Error::io(path, e))?;

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut root = dunce::canonicalize(existing).map_err(|e| Error::io(existing, e))?;
    for name in missing.iter().rev() {
        root.push(name);
    }
    Ok(root)
}
