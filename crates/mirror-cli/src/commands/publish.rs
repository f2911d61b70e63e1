//! Publish command: commit and push without reconciling

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use colored::Colorize;
use mirror_core::{MirrorConfig, MirrorDaemon, summarize_changes};

use crate::error::Result;

/// Publish the destination tree as it is on disk.
pub fn run_publish(config_path: &Path, message_paths: &[PathBuf]) -> Result<()> {
    let config = MirrorConfig::load(config_path)?;
    let publisher = MirrorDaemon::open_publisher(&config)?;

    let changed: BTreeSet<String> =
        summarize_changes(&config.source_root, message_paths.iter().map(PathBuf::as_path));
    let outcome = publisher.publish(&changed)?;

    if outcome.is_noop() {
        println!("{} Already up to date", "OK".green().bold());
        return Ok(());
    }
    if let Some(commit) = &outcome.commit {
        println!("{} Committed {}", "OK".green().bold(), commit.cyan());
    }
    if let Some(merge) = &outcome.merge_commit {
        println!("{} Merged upstream ({})", "OK".green().bold(), merge);
    }
    if outcome.pushed {
        println!("{} Pushed {}", "OK".green().bold(), config.branch.cyan());
    }
    Ok(())
}
