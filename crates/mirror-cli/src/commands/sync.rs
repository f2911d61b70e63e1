//! Sync command: one reconciliation pass, optionally published

use std::path::Path;

use colored::Colorize;
use mirror_core::{MirrorConfig, MirrorDaemon, PassOutcome, PendingChangeSet, ReconcileOptions};

use crate::error::Result;

/// Run one pass over the configured vault.
pub fn run_sync(config_path: &Path, publish: bool, dry_run: bool, json: bool) -> Result<()> {
    let mut config = MirrorConfig::load(config_path)?;
    config.publish = publish && !dry_run;

    let daemon = MirrorDaemon::new(config)?;
    let options = ReconcileOptions {
        dry_run,
        ..daemon.reconciler().options().clone()
    };
    let daemon = daemon.with_reconcile_options(options);
    if !dry_run {
        daemon.bootstrap()?;
    }

    let outcome = daemon.run_pass(&PendingChangeSet::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &PassOutcome) {
    let report = &outcome.reconcile;

    if report.dry_run {
        println!("{} Dry run, nothing was modified", "=>".blue().bold());
    }
    for action in report.actions() {
        println!("   {} {}", "+".green(), action);
    }
    for skipped in &report.skipped {
        println!(
            "   {} {}: {}",
            "!".yellow(),
            skipped.path.cyan(),
            skipped.message
        );
    }
    for collision in &report.collisions {
        println!(
            "   {} {} replaced {} at {}",
            "!".yellow(),
            collision.winner.cyan(),
            collision.replaced.cyan(),
            collision.destination
        );
    }

    let status = if report.is_success() {
        "OK".green().bold()
    } else {
        "WARN".yellow().bold()
    };
    println!("{} {}", status, report.summary());

    if let Some(publish) = &outcome.publish {
        match (&publish.commit, publish.pushed) {
            (Some(commit), true) => println!("{} Committed {} and pushed", "OK".green().bold(), commit),
            (Some(commit), false) => println!("{} Committed {}", "OK".green().bold(), commit),
            (None, true) => println!("{} Pushed pending commits", "OK".green().bold()),
            (None, false) => println!("{} Nothing to publish", "OK".green().bold()),
        }
    }
}
