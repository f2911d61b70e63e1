//! One sync pass: reconcile the destination tree, then publish it

use mirror_git::GitRepository;
use serde::Serialize;

use crate::aggregator::PendingChangeSet;
use crate::config::MirrorConfig;
use crate::debounce::SyncPass;
use crate::publish::{PublishOutcome, Publisher, summarize_changes};
use crate::reconcile::{ReconcileOptions, ReconcileReport, Reconciler};
use crate::{Error, Result};

/// Result of one full pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    pub reconcile: ReconcileReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishOutcome>,
}

/// Reconciler plus (optionally) a publisher over the site repository.
pub struct MirrorDaemon {
    config: MirrorConfig,
    reconciler: Reconciler,
    publisher: Option<Publisher<GitRepository>>,
}

impl MirrorDaemon {
    /// Build a daemon from configuration.
    ///
    /// Fails if the source root is missing, or if publishing is enabled and
    /// no git repository contains the content root.
    pub fn new(mut config: MirrorConfig) -> Result<Self> {
        if !config.source_root.is_dir() {
            return Err(Error::SourceRootMissing {
                path: config.source_root.clone(),
            });
        }
        config.canonicalize_roots()?;

        let reconciler = Reconciler::from_config(&config);
        let publisher = if config.publish {
            Some(Self::open_publisher(&config)?)
        } else {
            None
        };

        Ok(Self {
            config,
            reconciler,
            publisher,
        })
    }

    /// Open the git repository the configuration publishes to.
    pub fn open_publisher(config: &MirrorConfig) -> Result<Publisher<GitRepository>> {
        // The content root may not exist before the first bootstrap
        let search = config.repo_search_path();
        let start = search.ancestors().find(|p| p.exists()).unwrap_or(search);
        let repo = GitRepository::discover(start, &config.remote, &config.branch)?;
        tracing::debug!(repo = %repo.root(), "Publishing through git repository");
        Ok(Publisher::new(repo, &config.branch))
    }

    /// Apply dry-run (or other) options to the reconciler.
    pub fn with_reconcile_options(mut self, options: ReconcileOptions) -> Self {
        self.reconciler = self.reconciler.with_options(options);
        self
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Create the managed roots.
    pub fn bootstrap(&self) -> Result<()> {
        for root in self.reconciler.bootstrap()? {
            tracing::debug!(path = %root, "Bootstrapped managed root");
        }
        Ok(())
    }

    /// Reconcile, then publish if enabled and not a dry run.
    ///
    /// A failed reconciliation skips publishing. A failed publish is
    /// returned as an error; the reconciled files stay on disk.
    pub fn run_pass(&self, changes: &PendingChangeSet) -> Result<PassOutcome> {
        let reconcile = self.reconciler.reconcile()?;
        for skipped in &reconcile.skipped {
            tracing::debug!(path = %skipped.path, message = %skipped.message, "Skipped during pass");
        }

        let publish = match &self.publisher {
            Some(publisher) if !self.reconciler.options().dry_run => {
                let changed = summarize_changes(
                    &self.config.source_root,
                    changes.iter().map(|p| p.as_path()),
                );
                match publisher.publish(&changed) {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        tracing::error!(error = %e, "Publish failed; changes will be retried next pass");
                        return Err(e);
                    }
                }
            }
            _ => None,
        };

        Ok(PassOutcome { reconcile, publish })
    }
}

impl SyncPass for MirrorDaemon {
    fn run(&self, changes: PendingChangeSet) -> Result<()> {
        self.run_pass(&changes).map(|_| ())
    }
}
