//! Configuration loading tests

use std::fs;
use std::path::Path;

use mirror_core::{Error, FailurePolicy, MirrorConfig};
use mirror_fs::canonical_root;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

#[rstest]
#[case::toml(
    "vault-mirror.toml",
    "source_root = \"vault\"\ncontent_root = \"site/content\"\nlanguages = [\"english\"]\n"
)]
#[case::yaml(
    "vault-mirror.yaml",
    "source_root: vault\ncontent_root: site/content\nlanguages: [english]\n"
)]
#[case::json(
    "vault-mirror.json",
    r#"{"source_root": "vault", "content_root": "site/content", "languages": ["english"]}"#
)]
fn test_load_resolves_relative_paths(#[case] file_name: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(file_name);
    fs::write(&path, content).unwrap();

    let config = MirrorConfig::load(&path).unwrap();

    let base = canonical_root(temp.path()).unwrap();
    assert_eq!(config.source_root, base.join("vault"));
    assert_eq!(config.content_root, base.join("site/content"));
    assert_eq!(config.languages, vec!["english"]);
    assert_eq!(config.failure_policy, FailurePolicy::Omit);
}

#[test]
fn test_relative_roots_become_absolute() {
    // A bare `vault-mirror.toml` has an empty parent directory
    let mut config = MirrorConfig::new("src", "not-yet/content");
    config.resolve_paths(Path::new(""));
    config.canonicalize_roots().unwrap();

    let cwd = canonical_root(Path::new(".")).unwrap();
    assert_eq!(config.source_root, cwd.join("src"));
    assert_eq!(config.content_root, cwd.join("not-yet").join("content"));
}

#[test]
fn test_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = MirrorConfig::load(&temp.path().join("vault-mirror.toml"));
    assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
}

#[test]
fn test_missing_required_key() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vault-mirror.toml");
    fs::write(&path, "source_root = \"vault\"\n").unwrap();

    let result = MirrorConfig::load(&path);
    assert!(matches!(result, Err(Error::Fs(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vault-mirror.toml");
    fs::write(
        &path,
        "source_root = \"v\"\ncontent_root = \"c\"\ndebounce_secs = 0\n",
    )
    .unwrap();

    assert!(matches!(
        MirrorConfig::load(&path),
        Err(Error::InvalidConfig { .. })
    ));
}

#[test]
fn test_save_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vault-mirror.toml");
    let mut config = MirrorConfig::new(temp.path().join("vault"), temp.path().join("content"));
    config.categories = vec!["blog".to_string(), "notes".to_string()];
    config.failure_policy = FailurePolicy::KeepExisting;
    config.canonicalize_roots().unwrap();

    config.save(&path).unwrap();
    let loaded = MirrorConfig::load(&path).unwrap();

    assert_eq!(loaded, config);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("failure_policy = \"keep-existing\""));
}
