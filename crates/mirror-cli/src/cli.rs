//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// vault-mirror - Mirror a note vault into a Hugo site and publish it
#[derive(Parser, Debug)]
#[command(name = "vault-mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML, or JSON)
    #[arg(
        short,
        long,
        global = true,
        env = "VAULT_MIRROR_CONFIG",
        default_value = "vault-mirror.toml"
    )]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Vault folder to mirror
        #[arg(long, default_value = "vault")]
        source_root: PathBuf,

        /// Destination content root
        #[arg(long, default_value = "content")]
        content_root: PathBuf,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Run one reconciliation pass
    Sync {
        /// Publish the result through git afterwards
        #[arg(long)]
        publish: bool,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output the report as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Commit and push the destination tree without reconciling
    Publish {
        /// Source paths to list in the commit message
        #[arg(long = "message-path", value_name = "PATH")]
        message_paths: Vec<PathBuf>,
    },

    /// Sync once, then keep syncing after every quiet period
    Watch,
}
