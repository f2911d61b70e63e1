//! Git repository fixtures.
//!
//! Fixtures drive the `git` CLI rather than libgit2 so that the code under
//! test never shares state with the setup that produced the repository.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run `git` in `dir`, panicking with stderr on failure. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "git: `git {args:?}` in {} failed:\n{}",
            dir.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn configure_identity(path: &Path) {
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);
}

/// Initialises a working repository on `main` with one commit.
///
/// # Panics
/// Panics if any git operation fails.
pub fn repo_with_commit(path: &Path) {
    fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("repo_with_commit: failed to create {}: {e}", path.display()));
    git(path, &["init"]);
    // Independent of the installed git's default branch name
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure_identity(path);

    fs::write(path.join("README.md"), "# Site\n")
        .unwrap_or_else(|e| panic!("repo_with_commit: failed to write README.md: {e}"));
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);
}

/// A bare remote plus a working clone tracking its `main` branch.
pub struct RemoteFixture {
    /// Path of the bare repository
    pub remote: PathBuf,
    /// Path of the working clone
    pub work: PathBuf,
}

impl RemoteFixture {
    /// Create `remote.git` and a clone named `work` inside `base`.
    ///
    /// `main` holds one commit and has been pushed.
    ///
    /// # Panics
    /// Panics if any git operation fails.
    pub fn new(base: &Path) -> Self {
        let remote = base.join("remote.git");
        let work = base.join("work");

        fs::create_dir_all(&remote)
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to create remote dir: {e}"));
        git(&remote, &["init", "--bare"]);
        git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        repo_with_commit(&work);
        let remote_url = remote.to_string_lossy().into_owned();
        git(&work, &["remote", "add", "origin", &remote_url]);
        git(&work, &["push", "-u", "origin", "main"]);

        Self { remote, work }
    }

    /// Clone the remote into `base/<name>`, simulating another publisher.
    pub fn other_clone(&self, name: &str) -> PathBuf {
        let base = self
            .remote
            .parent()
            .unwrap_or_else(|| panic!("RemoteFixture: remote has no parent"));
        let path = base.join(name);
        let remote_url = self.remote.to_string_lossy().into_owned();
        let target = path.to_string_lossy().into_owned();
        git(base, &["clone", "--branch", "main", &remote_url, &target]);
        configure_identity(&path);
        path
    }

    /// Commit `content` at `file` in `clone` and push it to the remote.
    pub fn push_change(clone: &Path, file: &str, content: &str) {
        let path = clone.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("push_change: failed to create dirs: {e}"));
        }
        fs::write(&path, content).unwrap_or_else(|e| panic!("push_change: failed to write: {e}"));
        git(clone, &["add", "-A"]);
        git(clone, &["commit", "-m", &format!("Update {file}")]);
        git(clone, &["push", "origin", "main"]);
    }

    /// Commit id of `main` on the remote.
    pub fn remote_head(&self) -> String {
        git(&self.remote, &["rev-parse", "refs/heads/main"])
            .trim()
            .to_string()
    }

    /// Commit id of `HEAD` in the working clone.
    pub fn work_head(&self) -> String {
        git(&self.work, &["rev-parse", "HEAD"]).trim().to_string()
    }

    /// Paths tracked at the tip of the remote's `main`.
    pub fn remote_files(&self) -> Vec<String> {
        git(
            &self.remote,
            &["ls-tree", "-r", "--name-only", "refs/heads/main"],
        )
        .lines()
        .map(str::to_string)
        .collect()
    }

    /// Full message of the remote's latest commit.
    pub fn remote_head_message(&self) -> String {
        git(&self.remote, &["log", "-1", "--format=%B", "refs/heads/main"])
    }
}

/// Initialises an empty repository with `git2` (no commits, no config).
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn empty_git_repo(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "empty_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}
