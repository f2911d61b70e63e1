//! Init command: write a default configuration file

use std::path::Path;

use colored::Colorize;
use mirror_core::MirrorConfig;

use crate::error::{CliError, Result};

/// Write a configuration with default settings to `config_path`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn run_init(config_path: &Path, source_root: &Path, content_root: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    let config = MirrorConfig::new(source_root, content_root);
    config.validate()?;
    config.save(config_path)?;

    println!(
        "{} Wrote {}",
        "OK".green().bold(),
        config_path.display().to_string().cyan()
    );
    println!(
        "   source_root  = {}\n   content_root = {}",
        source_root.display(),
        content_root.display()
    );
    Ok(())
}
