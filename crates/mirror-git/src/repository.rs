//! libgit2-backed implementation of [`VersionControl`]

use std::cell::RefCell;
use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, FetchOptions, IndexAddOption, MergeOptions, Oid, PushOptions, Repository,
    ResetType, Signature,
};
use mirror_fs::NormalizedPath;

use crate::auth::remote_callbacks;
use crate::provider::{AheadBehind, MergeOutcome, VersionControl};
use crate::{Error, Result};

/// Identity used when neither the repository nor the user configures one.
const FALLBACK_NAME: &str = "vault-mirror";
const FALLBACK_EMAIL: &str = "vault-mirror@localhost";

/// A working-tree repository published to a single remote branch.
///
/// The repository is reopened for every operation so that changes made by
/// other tools between publish attempts are always observed.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: NormalizedPath,
    remote: String,
    branch: String,
}

impl GitRepository {
    /// Create a handle for the repository at `root`.
    ///
    /// Fails if `root` is not a git working tree.
    pub fn new(root: impl AsRef<Path>, remote: &str, branch: &str) -> Result<Self> {
        let root = root.as_ref();
        Repository::open(root).map_err(|_| Error::NotARepository {
            path: root.to_path_buf(),
        })?;
        Ok(Self {
            root: NormalizedPath::new(root),
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
    }

    /// Create a handle for the repository whose working tree contains `path`.
    pub fn discover(path: impl AsRef<Path>, remote: &str, branch: &str) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|_| Error::NotARepository {
            path: path.to_path_buf(),
        })?;
        let workdir = repo.workdir().ok_or_else(|| Error::NotARepository {
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            root: NormalizedPath::new(workdir),
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(self.root.to_native()).map_err(|_| Error::NotARepository {
            path: self.root.to_native(),
        })
    }

    fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    fn tracking_ref(&self) -> String {
        format!("refs/remotes/{}/{}", self.remote, self.branch)
    }

    /// Ensure `HEAD` names the configured branch (born or not).
    fn check_head(&self, repo: &Repository) -> Result<()> {
        let head = repo.find_reference("HEAD")?;
        match head.symbolic_target() {
            Some(target) if target == self.local_ref() => Ok(()),
            Some(target) => Err(Error::WrongBranch {
                expected: self.branch.clone(),
                actual: target.trim_start_matches("refs/heads/").to_string(),
            }),
            None => Err(Error::WrongBranch {
                expected: self.branch.clone(),
                actual: "HEAD (detached)".to_string(),
            }),
        }
    }

    fn local_oid(&self, repo: &Repository) -> Option<Oid> {
        repo.find_branch(&self.branch, BranchType::Local)
            .ok()
            .and_then(|b| b.get().target())
    }

    fn upstream_oid(&self, repo: &Repository) -> Option<Oid> {
        repo.find_reference(&self.tracking_ref())
            .ok()
            .and_then(|r| r.target())
    }

    fn signature(repo: &Repository) -> Result<Signature<'static>> {
        match repo.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(_) => Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?),
        }
    }

    /// Point the local branch at `target` and check it out, refusing to
    /// overwrite local modifications.
    fn move_branch_to(&self, repo: &Repository, target: Oid) -> Result<()> {
        let commit = repo.find_commit(target)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(|e| Error::CannotFastForward {
                message: e.message().to_string(),
            })?;

        let refname = self.local_ref();
        let log_message = format!("vault-mirror: fast-forward to {target}");
        match repo.find_reference(&refname) {
            Ok(mut reference) => {
                reference.set_target(target, &log_message)?;
            }
            Err(_) => {
                repo.reference(&refname, target, true, &log_message)?;
            }
        }
        repo.set_head(&refname)?;
        Ok(())
    }
}

impl VersionControl for GitRepository {
    fn fetch(&self) -> Result<()> {
        let repo = self.open()?;
        let mut remote = repo
            .find_remote(&self.remote)
            .map_err(|_| Error::RemoteNotFound {
                name: self.remote.clone(),
            })?;

        let mut options = FetchOptions::new();
        options.remote_callbacks(remote_callbacks(repo.config().ok()));

        let refspec = format!("+{}:{}", self.local_ref(), self.tracking_ref());
        remote
            .fetch(&[&refspec], Some(&mut options), None)
            .map_err(|e| Error::FetchFailed {
                message: e.message().to_string(),
            })?;

        tracing::debug!(remote = %self.remote, branch = %self.branch, "Fetched");
        Ok(())
    }

    fn ahead_behind(&self) -> Result<AheadBehind> {
        let repo = self.open()?;
        let local = self.local_oid(&repo);
        let upstream = self.upstream_oid(&repo);

        let (ahead, behind) = match (local, upstream) {
            (Some(local), Some(upstream)) => repo.graph_ahead_behind(local, upstream)?,
            // Nothing to compare against: count every local commit
            (Some(_), None) => (1, 0),
            (None, Some(_)) => (0, 1),
            (None, None) => (0, 0),
        };

        Ok(AheadBehind {
            ahead,
            behind,
            has_local: local.is_some(),
            has_upstream: upstream.is_some(),
        })
    }

    fn fast_forward(&self) -> Result<MergeOutcome> {
        let repo = self.open()?;
        self.check_head(&repo)?;

        let upstream = self
            .upstream_oid(&repo)
            .ok_or_else(|| Error::CannotFastForward {
                message: format!("no remote-tracking branch {}", self.tracking_ref()),
            })?;

        if let Some(local) = self.local_oid(&repo) {
            if local == upstream {
                return Ok(MergeOutcome::UpToDate);
            }
            if !repo.graph_descendant_of(upstream, local)? {
                return Err(Error::CannotFastForward {
                    message: format!("{} has diverged from {}", self.branch, self.tracking_ref()),
                });
            }
        }

        self.move_branch_to(&repo, upstream)?;
        tracing::info!(branch = %self.branch, target = %upstream, "Fast-forwarded");
        Ok(MergeOutcome::FastForward)
    }

    fn merge_tracking_branch(&self) -> Result<MergeOutcome> {
        let repo = self.open()?;
        self.check_head(&repo)?;

        let Some(upstream) = self.upstream_oid(&repo) else {
            return Ok(MergeOutcome::UpToDate);
        };
        let annotated = repo.find_annotated_commit(upstream)?;
        let (analysis, _) = repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            return Ok(MergeOutcome::UpToDate);
        }
        if analysis.is_fast_forward() || analysis.is_unborn() {
            self.move_branch_to(&repo, upstream)?;
            return Ok(MergeOutcome::FastForward);
        }

        let mut merge_opts = MergeOptions::new();
        repo.merge(&[&annotated], Some(&mut merge_opts), None)?;

        let mut index = repo.index()?;
        if index.has_conflicts() {
            let conflicted: Vec<String> = index
                .conflicts()?
                .filter_map(|c| c.ok())
                .filter_map(|c| c.our.or(c.their).or(c.ancestor))
                .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
                .collect();

            // Local changes were committed before merging, so resetting to
            // HEAD only discards the half-applied merge.
            let head_commit = repo.head()?.peel_to_commit()?;
            repo.reset(head_commit.as_object(), ResetType::Hard, None)?;
            repo.cleanup_state()?;

            return Err(Error::MergeConflict {
                message: format!(
                    "merging {} into {} conflicts in: {}",
                    self.tracking_ref(),
                    self.branch,
                    conflicted.join(", ")
                ),
            });
        }

        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let sig = Self::signature(&repo)?;
        let head_commit = repo.head()?.peel_to_commit()?;
        let upstream_commit = repo.find_commit(upstream)?;
        let message = format!(
            "Merge remote-tracking branch '{}/{}'",
            self.remote, self.branch
        );

        let oid = repo.commit(
            Some("HEAD"),
            &sig,
            &sig,
            &message,
            &tree,
            &[&head_commit, &upstream_commit],
        )?;
        repo.cleanup_state()?;

        tracing::info!(commit = %oid, "Merged remote-tracking branch");
        Ok(MergeOutcome::Merged {
            commit: oid.to_string(),
        })
    }

    fn stage_all(&self) -> Result<bool> {
        let repo = self.open()?;
        let mut index = repo.index()?;

        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        // add_all does not notice removed files
        index.update_all(["*"], None)?;
        index.write()?;

        let staged_tree = index.write_tree()?;
        let changed = match repo.head().ok().and_then(|h| h.peel_to_tree().ok()) {
            Some(head_tree) => head_tree.id() != staged_tree,
            None => !index.is_empty(),
        };
        Ok(changed)
    }

    fn commit(&self, message: &str) -> Result<String> {
        let repo = self.open()?;
        self.check_head(&repo)?;

        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let sig = Self::signature(&repo)?;

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        tracing::info!(commit = %oid, "Committed");
        Ok(oid.to_string())
    }

    fn push(&self, branch: &str) -> Result<()> {
        let repo = self.open()?;
        let mut remote = repo
            .find_remote(&self.remote)
            .map_err(|_| Error::RemoteNotFound {
                name: self.remote.clone(),
            })?;

        let rejection: RefCell<Option<(String, String)>> = RefCell::new(None);
        let mut callbacks = remote_callbacks(repo.config().ok());
        callbacks.push_update_reference(|reference, status| {
            if let Some(message) = status {
                *rejection.borrow_mut() = Some((reference.to_string(), message.to_string()));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        remote
            .push(&[&refspec], Some(&mut options))
            .map_err(|e| Error::PushFailed {
                message: e.message().to_string(),
            })?;
        drop(options);

        if let Some((reference, message)) = rejection.into_inner() {
            return Err(Error::PushRejected { reference, message });
        }

        tracing::info!(remote = %self.remote, branch = %branch, "Pushed");
        Ok(())
    }
}
