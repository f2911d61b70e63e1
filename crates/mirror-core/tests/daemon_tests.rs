//! Full passes against a site repository with a bare remote

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use mirror_core::{MirrorConfig, MirrorDaemon, ReconcileOptions, SyncPass};
use mirror_test_utils::git::{RemoteFixture, git};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Site {
    _temp: TempDir,
    fixture: RemoteFixture,
    vault: PathBuf,
}

fn setup() -> (Site, MirrorConfig) {
    let temp = TempDir::new().unwrap();
    let fixture = RemoteFixture::new(temp.path());
    let vault = temp.path().join("vault");
    fs::create_dir_all(vault.join("Blog")).unwrap();
    fs::write(
        vault.join("Blog/My Post.md"),
        "---\ntitle: Hello\n---\nSee [[Other]].",
    )
    .unwrap();

    let config = MirrorConfig::new(&vault, fixture.work.join("content"));
    (
        Site {
            _temp: temp,
            fixture,
            vault,
        },
        config,
    )
}

#[test]
fn test_pass_reconciles_and_pushes() {
    let (site, config) = setup();
    let daemon = MirrorDaemon::new(config).unwrap();
    daemon.bootstrap().unwrap();

    let changes: BTreeSet<PathBuf> = [site.vault.join("Blog/My Post.md")].into();
    let outcome = daemon.run_pass(&changes).unwrap();

    let publish = outcome.publish.unwrap();
    assert!(publish.commit.is_some());
    assert!(publish.pushed);

    let files = site.fixture.remote_files();
    assert!(files.contains(&"content/resources/blog/my-post.md".to_string()));
    assert!(files.contains(&"content/resources/blog/_index.md".to_string()));
    assert_eq!(
        site.fixture.remote_head_message().trim_end(),
        "Auto-commit from vault-mirror - Updated files:\nBlog/My Post.md"
    );
}

#[test]
fn test_unchanged_pass_makes_no_commit() {
    let (site, config) = setup();
    let daemon = MirrorDaemon::new(config).unwrap();
    daemon.run_pass(&BTreeSet::new()).unwrap();
    let head = site.fixture.remote_head();

    let outcome = daemon.run_pass(&BTreeSet::new()).unwrap();

    let publish = outcome.publish.unwrap();
    assert!(publish.is_noop());
    assert_eq!(site.fixture.remote_head(), head);
}

#[test]
fn test_deletion_is_published() {
    let (site, config) = setup();
    let daemon = MirrorDaemon::new(config).unwrap();
    daemon.run_pass(&BTreeSet::new()).unwrap();

    fs::remove_file(site.vault.join("Blog/My Post.md")).unwrap();
    daemon.run(BTreeSet::new()).unwrap();

    let files = site.fixture.remote_files();
    assert!(!files.contains(&"content/resources/blog/my-post.md".to_string()));
    assert!(files.contains(&"content/resources/blog/_index.md".to_string()));
}

#[test]
fn test_upstream_changes_are_merged() {
    let (site, config) = setup();
    let other = site.fixture.other_clone("other");
    RemoteFixture::push_change(&other, "config.toml", "baseURL = \"/\"\n");

    let daemon = MirrorDaemon::new(config).unwrap();
    let outcome = daemon.run_pass(&BTreeSet::new()).unwrap();

    assert!(outcome.publish.unwrap().pushed);
    let files = site.fixture.remote_files();
    assert!(files.contains(&"config.toml".to_string()));
    assert!(files.contains(&"content/resources/blog/my-post.md".to_string()));
    assert_eq!(site.fixture.work_head(), site.fixture.remote_head());
}

#[test]
fn test_dry_run_neither_writes_nor_publishes() {
    let (site, config) = setup();
    let head = site.fixture.remote_head();
    let daemon = MirrorDaemon::new(config).unwrap().with_reconcile_options(ReconcileOptions {
        dry_run: true,
        ..ReconcileOptions::default()
    });

    let outcome = daemon.run_pass(&BTreeSet::new()).unwrap();

    assert!(outcome.publish.is_none());
    assert!(!outcome.reconcile.written.is_empty());
    assert!(!site.fixture.work.join("content").exists());
    assert_eq!(site.fixture.remote_head(), head);
}

#[test]
fn test_publish_disabled() {
    let (site, mut config) = setup();
    config.publish = false;
    let daemon = MirrorDaemon::new(config).unwrap();

    let outcome = daemon.run_pass(&BTreeSet::new()).unwrap();

    assert!(outcome.publish.is_none());
    let status = git(&site.fixture.work, &["status", "--porcelain"]);
    assert!(status.contains("content/"));
}
