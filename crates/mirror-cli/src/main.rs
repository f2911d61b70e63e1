//! vault-mirror CLI
//!
//! Mirrors a note vault into a Hugo content tree and publishes it with git.

mod cli;
mod commands;
mod error;
mod watcher;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Log to stderr so `--json` output stays parseable.
///
/// `--verbose` forces `debug`; otherwise `RUST_LOG` applies, defaulting to
/// `info`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init {
            source_root,
            content_root,
            force,
        } => commands::run_init(&cli.config, &source_root, &content_root, force),
        Commands::Sync {
            publish,
            dry_run,
            json,
        } => commands::run_sync(&cli.config, publish, dry_run, json),
        Commands::Publish { message_paths } => commands::run_publish(&cli.config, &message_paths),
        Commands::Watch => commands::run_watch(&cli.config),
    }
}
