//! [`TestVault`] builder: a source vault and a destination content tree in
//! one temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary `vault/` (source) and `site/content/` (destination) roots.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::vault::TestVault;
///
/// let vault = TestVault::new();
/// vault.note("Blog/My Post.md", "---\ntitle: Hello\n---\nBody");
/// vault.assert_dest_exists("resources/blog/my-post.md");
/// ```
pub struct TestVault {
    temp_dir: TempDir,
}

impl Default for TestVault {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVault {
    /// Create empty source and destination roots.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("vault")).unwrap();
        fs::create_dir_all(temp_dir.path().join("site/content")).unwrap();
        Self { temp_dir }
    }

    /// Directory holding both roots.
    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.base().join("vault")
    }

    pub fn dest(&self) -> PathBuf {
        self.base().join("site/content")
    }

    /// Write a source note (any file) at a vault-relative path.
    pub fn note(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.source().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Create an empty source folder.
    pub fn folder(&self, relative: &str) -> PathBuf {
        let path = self.source().join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Delete a source file.
    pub fn remove_note(&self, relative: &str) {
        fs::remove_file(self.source().join(relative)).unwrap();
    }

    /// Write a file directly into the destination tree.
    pub fn dest_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dest().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Read a destination file.
    pub fn read_dest(&self, relative: &str) -> String {
        let path = self.dest().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
    }

    pub fn assert_dest_exists(&self, relative: &str) {
        let path = self.dest().join(relative);
        assert!(path.exists(), "Expected {} to exist", path.display());
    }

    pub fn assert_dest_not_exists(&self, relative: &str) {
        let path = self.dest().join(relative);
        assert!(!path.exists(), "Expected {} to NOT exist", path.display());
    }

    pub fn assert_dest_contains(&self, relative: &str, expected: &str) {
        let content = self.read_dest(relative);
        assert!(
            content.contains(expected),
            "File {relative} does not contain '{expected}'.\nContent:\n{content}"
        );
    }

    /// Every file under the destination root, as sorted `/`-separated
    /// relative paths.
    pub fn dest_files(&self) -> Vec<String> {
        fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
            let Ok(entries) = fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, root, out);
                } else {
                    let rel = path.strip_prefix(root).unwrap();
                    let rel = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/");
                    out.push(rel);
                }
            }
        }

        let mut files = Vec::new();
        let root = self.dest();
        walk(&root, &root, &mut files);
        files.sort();
        files
    }
}
