//! Daemon configuration
//!
//! Loaded from TOML, YAML, or JSON (by file extension) through
//! [`mirror_fs::ConfigStore`]. Relative paths are resolved against the
//! directory holding the configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mirror_content::{Classifier, Transformer};
use mirror_fs::{ConfigStore, NormalizedPath, canonical_root};
use serde::{Deserialize, Serialize};

use crate::layout::Layout;
use crate::{Error, Result};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "vault-mirror.toml";

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_debounce_secs() -> u64 {
    120
}

fn default_resources_dir() -> String {
    "resources".to_string()
}

fn default_categories() -> Vec<String> {
    vec!["blog".to_string()]
}

fn default_true() -> bool {
    true
}

/// What happens to a published artifact whose source failed to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Treat the artifact as no longer produced; it is deleted.
    #[default]
    Omit,
    /// Keep the previously published artifact until the source recovers.
    KeepExisting,
}

/// Configuration for one vault-to-site mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Vault folder to mirror
    pub source_root: PathBuf,

    /// Destination content root (e.g. `<site>/content`)
    pub content_root: PathBuf,

    /// Git working tree to publish; defaults to the repository containing
    /// `content_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<PathBuf>,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Quiet period before a pass, in seconds
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Language codes; non-empty enables multi-language mode
    #[serde(default)]
    pub languages: Vec<String>,

    /// Name of the managed subtree under each content root
    #[serde(default = "default_resources_dir")]
    pub resources_dir: String,

    /// Folder names that classify notes, in priority order
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Skip dot-entries such as `.obsidian` and `.trash`
    #[serde(default = "default_true")]
    pub ignore_hidden: bool,

    /// Publish after every watch pass
    #[serde(default = "default_true")]
    pub publish: bool,
}

impl MirrorConfig {
    /// Configuration with every optional key at its default.
    pub fn new(source_root: impl Into<PathBuf>, content_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            content_root: content_root.into(),
            repo_path: None,
            remote: default_remote(),
            branch: default_branch(),
            debounce_secs: default_debounce_secs(),
            languages: Vec::new(),
            resources_dir: default_resources_dir(),
            categories: default_categories(),
            failure_policy: FailurePolicy::default(),
            ignore_hidden: true,
            publish: true,
        }
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut config: Self = ConfigStore::new().load(&NormalizedPath::new(path))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.canonicalize_roots()?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write this configuration to `path`, format chosen by extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigStore::new().save(&NormalizedPath::new(path), self)?;
        Ok(())
    }

    /// Make relative paths absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.source_root);
        resolve(&mut self.content_root);
        if let Some(repo_path) = self.repo_path.as_mut() {
            resolve(repo_path);
        }
    }

    /// Replace every root with its canonical absolute form so watcher event
    /// paths and commit summaries compare against the same prefix.
    pub fn canonicalize_roots(&mut self) -> Result<()> {
        self.source_root = canonical_root(&self.source_root)?;
        self.content_root = canonical_root(&self.content_root)?;
        if let Some(repo_path) = self.repo_path.as_mut() {
            *repo_path = canonical_root(repo_path)?;
        }
        Ok(())
    }

    /// Reject values the reconciler cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfig { message });

        if self.resources_dir.is_empty() || self.resources_dir.contains(['/', '\\']) {
            return invalid(format!(
                "resources_dir must be a single folder name, got '{}'",
                self.resources_dir
            ));
        }
        if self.debounce_secs == 0 {
            return invalid("debounce_secs must be at least 1".to_string());
        }
        for (i, language) in self.languages.iter().enumerate() {
            if language.is_empty() || language.contains(['/', '\\']) {
                return invalid(format!("invalid language code '{language}'"));
            }
            if self.languages[..i].contains(language) {
                return invalid(format!("language '{language}' is listed twice"));
            }
        }
        if self.remote.is_empty() || self.branch.is_empty() {
            return invalid("remote and branch must not be empty".to_string());
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.content_root, &self.resources_dir).with_languages(self.languages.clone())
    }

    pub fn transformer(&self) -> Transformer {
        Transformer::new(Classifier::new(&self.categories))
    }

    /// Where to look for the git repository.
    pub fn repo_search_path(&self) -> &Path {
        self.repo_path.as_deref().unwrap_or(&self.content_root)
    }
}
