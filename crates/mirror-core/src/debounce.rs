//! Debounce driver
//!
//! Sleeps until the aggregator's deadline, wakes early whenever a new event
//! moves it, and runs one pass at a time on the blocking pool.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Notify;

use crate::aggregator::{ChangeAggregator, FsEvent, PendingChangeSet};
use crate::{Error, Result};

/// Work performed when a debounce window closes.
pub trait SyncPass: Send + Sync + 'static {
    /// Run a blocking pass. `changes` lists the source paths that changed
    /// during the window.
    fn run(&self, changes: PendingChangeSet) -> Result<()>;
}

/// Cloneable handle for feeding events into a [`Debouncer`] from any thread.
#[derive(Debug, Clone)]
pub struct EventSink {
    aggregator: Arc<ChangeAggregator>,
    wakeup: Arc<Notify>,
}

impl EventSink {
    /// Record an event and wake the driver if it was relevant.
    pub fn submit(&self, event: FsEvent) -> bool {
        let accepted = self.aggregator.on_event(&event);
        if accepted {
            self.wakeup.notify_one();
        }
        accepted
    }
}

/// Drives a [`ChangeAggregator`] and runs a [`SyncPass`] per closed window.
pub struct Debouncer<P> {
    aggregator: Arc<ChangeAggregator>,
    wakeup: Arc<Notify>,
    pass: Arc<P>,
}

impl<P: SyncPass> Debouncer<P> {
    pub fn new(aggregator: Arc<ChangeAggregator>, pass: P) -> Self {
        Self {
            aggregator,
            wakeup: Arc::new(Notify::new()),
            pass: Arc::new(pass),
        }
    }

    pub fn sink(&self) -> EventSink {
        EventSink {
            aggregator: Arc::clone(&self.aggregator),
            wakeup: Arc::clone(&self.wakeup),
        }
    }

    pub fn aggregator(&self) -> &Arc<ChangeAggregator> {
        &self.aggregator
    }

    /// Run one pass immediately, outside any debounce window.
    ///
    /// Events submitted while it runs are kept by the aggregator and arm the
    /// next window, so start watching before calling this.
    pub async fn run_initial(&self) -> Result<()> {
        tracing::info!("Starting initial sync pass");
        self.execute(PendingChangeSet::new()).await
    }

    async fn execute(&self, changes: PendingChangeSet) -> Result<()> {
        let pass = Arc::clone(&self.pass);
        tokio::task::spawn_blocking(move || pass.run(changes))
            .await
            .map_err(|e| Error::PassAborted {
                message: e.to_string(),
            })
            .and_then(|r| r)
    }

    /// Run passes until `shutdown` completes. Returns the number of passes
    /// run.
    ///
    /// Shutdown is only observed between passes; a running pass always
    /// finishes. A failed pass is logged and the loop keeps going.
    pub async fn run_until<F>(self, shutdown: F) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut passes = 0;

        loop {
            let deadline = self.aggregator.deadline();
            let window_closed = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = &mut shutdown => break,
                // The deadline may have moved; re-read it
                _ = self.wakeup.notified() => continue,
                _ = window_closed => {}
            }

            let Some(changes) = self.aggregator.on_timer_fired() else {
                continue;
            };

            tracing::info!(changes = changes.len(), "Quiet period elapsed, starting sync pass");
            let result = self.execute(changes).await;
            passes += 1;

            if let Err(e) = result {
                tracing::error!(error = %e, "Sync pass failed");
            }
            self.aggregator.on_pass_complete();
        }

        tracing::info!(passes, "Debouncer stopped");
        Ok(passes)
    }
}
