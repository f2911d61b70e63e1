//! Reconciliation engine for vault-mirror
//!
//! Keeps a Hugo content tree in sync with a note vault:
//!
//! - **Layout**: where each source note lands in the destination tree
//! - **Reconciler**: full-tree walk that writes, indexes, and deletes artifacts
//! - **ChangeAggregator / Debouncer**: coalesce bursts of filesystem events
//!   into a single pass
//! - **Publisher**: stage, commit, merge, and push the destination tree
//! - **MirrorDaemon**: one pass = reconcile, then publish
//!
//! ```text
//!   fs events -> ChangeAggregator -> Debouncer -> MirrorDaemon
//!                                                  |        |
//!                                            Reconciler  Publisher
//!                                                  |        |
//!                                          mirror-content  mirror-git
//! ```

pub mod aggregator;
pub mod config;
pub mod daemon;
pub mod debounce;
pub mod error;
pub mod layout;
pub mod publish;
pub mod reconcile;

pub use aggregator::{AggregatorState, ChangeAggregator, FsEvent, FsEventKind, PendingChangeSet, is_relevant};
pub use config::{FailurePolicy, MirrorConfig};
pub use daemon::{MirrorDaemon, PassOutcome};
pub use debounce::{Debouncer, EventSink, SyncPass};
pub use error::{Error, Result};
pub use layout::Layout;
pub use publish::{PublishOutcome, Publisher, commit_message, summarize_changes};
pub use reconcile::{Collision, ReconcileOptions, ReconcileReport, Reconciler, SkippedFile};
