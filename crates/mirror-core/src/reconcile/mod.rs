//! Tree reconciliation
//!
//! A pass walks the whole source vault, publishes every eligible note,
//! creates folder indexes, and finally deletes destination files that no
//! source maps to any more.

mod engine;
mod report;

pub use engine::{ReconcileOptions, Reconciler};
pub use report::{Collision, ReconcileReport, SkippedFile};
