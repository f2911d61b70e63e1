//! Watch command: sync on every quiet period until Ctrl-C

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use mirror_core::{ChangeAggregator, Debouncer, MirrorConfig, MirrorDaemon};

use crate::error::{CliError, Result};
use crate::watcher;

/// Bootstrap, run an initial pass, then debounce and sync forever.
pub fn run_watch(config_path: &Path) -> Result<()> {
    let config = MirrorConfig::load(config_path)?;
    let daemon = MirrorDaemon::new(config.clone())?;
    daemon.bootstrap()?;

    println!(
        "{} Mirroring {} -> {} (quiet period {}s)",
        "=>".blue().bold(),
        config.source_root.display().to_string().cyan(),
        config.content_root.display().to_string().cyan(),
        config.debounce_secs
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let aggregator = Arc::new(ChangeAggregator::new(config.debounce()));
        let debouncer = Debouncer::new(aggregator, daemon);
        // Watch first so edits saved during the initial walk arm the next window
        let _watcher = watcher::watch(&config.source_root, config.ignore_hidden, debouncer.sink())?;

        // An initial failure must not prevent watching
        if let Err(e) = debouncer.run_initial().await {
            tracing::error!(error = %e, "Initial sync pass failed");
        }

        let passes = debouncer
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                }
            })
            .await?;

        println!("{} Stopped after {} passes", "OK".green().bold(), passes);
        Ok::<(), CliError>(())
    })
}
