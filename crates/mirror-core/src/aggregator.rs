//! Change aggregation for debounced sync passes
//!
//! ```text
//!   IDLE --event--> ACCUMULATING --deadline elapsed--> RECONCILING --done--> IDLE
//!                    ^      |                                |
//!                    +event-+       events during a pass arm a new deadline
//! ```
//!
//! The pending set only feeds the commit message; every pass re-walks the
//! whole tree regardless of what it contains.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use mirror_content::DOCUMENT_EXTENSION;
use tokio::time::Instant;

/// Source paths changed since the last pass.
pub type PendingChangeSet = BTreeSet<PathBuf>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsEventKind {
    Created,
    Modified,
    Moved,
    Deleted,
}

/// A filesystem notification, reduced to what the aggregator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
    pub is_directory: bool,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            is_directory: false,
        }
    }

    pub fn directory(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            is_directory: true,
            ..Self::new(path, kind)
        }
    }
}

/// Whether an event can affect published output: any change to a
/// non-directory path with the document extension.
pub fn is_relevant(event: &FsEvent) -> bool {
    !event.is_directory && has_document_extension(&event.path)
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Idle,
    Accumulating,
    Reconciling,
}

#[derive(Debug, Default)]
struct Inner {
    pending: PendingChangeSet,
    deadline: Option<Instant>,
    reconciling: bool,
}

/// Buffers relevant events and decides when a pass may start.
///
/// All methods take `&self`; the state lives behind a mutex so the watcher
/// thread and the debounce driver can share one instance.
#[derive(Debug)]
pub struct ChangeAggregator {
    delay: Duration,
    inner: Mutex<Inner>,
}

impl ChangeAggregator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State stays consistent even if a holder panicked mid-update
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an event. Returns whether it was relevant (and so moved the
    /// deadline).
    pub fn on_event(&self, event: &FsEvent) -> bool {
        self.on_event_at(event, Instant::now())
    }

    pub fn on_event_at(&self, event: &FsEvent, now: Instant) -> bool {
        if !is_relevant(event) {
            return false;
        }
        let mut inner = self.lock();
        inner.pending.insert(event.path.clone());
        inner.deadline = Some(now + self.delay);
        tracing::debug!(path = %event.path.display(), kind = ?event.kind, "Change recorded");
        true
    }

    /// When the current window closes, if one is open.
    pub fn deadline(&self) -> Option<Instant> {
        self.lock().deadline
    }

    pub fn state(&self) -> AggregatorState {
        let inner = self.lock();
        if inner.reconciling {
            AggregatorState::Reconciling
        } else if inner.deadline.is_some() {
            AggregatorState::Accumulating
        } else {
            AggregatorState::Idle
        }
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Start a pass if the window has really closed.
    ///
    /// Returns the accumulated changes and enters `Reconciling`, or `None`
    /// when the deadline was pushed back by a racing event, no window is
    /// open, or a pass is already running.
    pub fn on_timer_fired(&self) -> Option<PendingChangeSet> {
        self.on_timer_fired_at(Instant::now())
    }

    pub fn on_timer_fired_at(&self, now: Instant) -> Option<PendingChangeSet> {
        let mut inner = self.lock();
        if inner.reconciling {
            return None;
        }
        match inner.deadline {
            Some(deadline) if now >= deadline => {
                inner.deadline = None;
                inner.reconciling = true;
                Some(std::mem::take(&mut inner.pending))
            }
            _ => None,
        }
    }

    /// Mark the running pass as finished.
    ///
    /// Returns `Accumulating` if events arrived during the pass.
    pub fn on_pass_complete(&self) -> AggregatorState {
        self.lock().reconciling = false;
        self.state()
    }
}
