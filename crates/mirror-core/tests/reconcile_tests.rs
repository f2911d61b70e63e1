//! Reconciliation pass tests against temporary vaults

use std::fs;

use mirror_core::{FailurePolicy, MirrorConfig, ReconcileOptions, Reconciler};
use mirror_test_utils::vault::TestVault;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn reconciler(vault: &TestVault) -> Reconciler {
    Reconciler::from_config(&MirrorConfig::new(vault.source(), vault.dest()))
}

#[test]
fn test_blog_note_scenario() {
    let vault = TestVault::new();
    vault.note(
        "Blog/notes/My Post^abc123.md",
        "---\ntitle: Draft\n---\nLink to [[Other Page]] and ==highlight==.",
    );

    reconciler(&vault).reconcile().unwrap();

    assert_eq!(
        vault.read_dest("resources/blog/notes/my-post.md"),
        "+++\nmeta_title = \"Draft\"\ntitle = \"Draft\"\ntype = \"blog\"\n+++\n\n\
         Link to [Other Page](Other Page) and <mark>highlight</mark>."
    );
}

#[test]
fn test_new_folder_gets_index_with_original_name() {
    let vault = TestVault::new();
    vault.note("Field Notes/first.md", "Body");

    let report = reconciler(&vault).reconcile().unwrap();

    assert_eq!(
        vault.read_dest("resources/field-notes/_index.md"),
        "+++\ntitle = \"Field Notes\"\nmeta_title = \"Field Notes\"\n+++\n"
    );
    assert_eq!(report.indexes_created, vec!["resources/field-notes/_index.md"]);
}

#[test]
fn test_blog_folder_index_is_classified() {
    let vault = TestVault::new();
    vault.folder("Blog/2024");

    reconciler(&vault).reconcile().unwrap();

    vault.assert_dest_contains("resources/blog/_index.md", "type = \"blog\"");
    vault.assert_dest_contains("resources/blog/2024/_index.md", "type = \"blog\"");
}

#[test]
fn test_managed_root_gets_no_generated_index() {
    let vault = TestVault::new();
    vault.note("top.md", "Body");

    reconciler(&vault).reconcile().unwrap();

    vault.assert_dest_exists("resources/top.md");
    vault.assert_dest_not_exists("resources/_index.md");
}

#[test]
fn test_vault_root_marker_is_copied_into_managed_root() {
    let vault = TestVault::new();
    vault.note("_index.md", "---\ntitle: Resources\n---\n");
    vault.note("a.md", "A");

    let report = reconciler(&vault).reconcile().unwrap();

    assert_eq!(report.markers_copied, vec!["resources/_index.md"]);
    assert_eq!(
        vault.read_dest("resources/_index.md"),
        "---\ntitle: Resources\n---\n"
    );
    assert!(report.indexes_created.is_empty());
}

#[test]
fn test_language_folder_marker_and_index() {
    let vault = TestVault::new();
    vault.note("english/_index.md", "---\ntitle: English\n---\n");
    vault.note("english/a.md", "A");
    vault.note("dutch/b.md", "B");

    let mut config = MirrorConfig::new(vault.source(), vault.dest());
    config.languages = vec!["english".to_string(), "dutch".to_string()];
    let report = Reconciler::from_config(&config).reconcile().unwrap();

    assert_eq!(report.markers_copied, vec!["english/resources/_index.md"]);
    assert_eq!(
        vault.read_dest("english/resources/_index.md"),
        "---\ntitle: English\n---\n"
    );
    assert_eq!(report.indexes_created, vec!["dutch/resources/_index.md"]);
    assert_eq!(
        vault.read_dest("dutch/resources/_index.md"),
        "+++\ntitle = \"dutch\"\nmeta_title = \"dutch\"\n+++\n"
    );
}

#[test]
fn test_second_pass_is_idempotent() {
    let vault = TestVault::new();
    vault.note("Blog/a.md", "---\ntitle: A\ndate: 2024-03-01\n---\nBody ^ref");
    vault.note("Misc/b.md", "No header");
    let reconciler = reconciler(&vault);

    reconciler.reconcile().unwrap();
    let first: Vec<(String, String)> = vault
        .dest_files()
        .into_iter()
        .map(|f| {
            let content = vault.read_dest(&f);
            (f, content)
        })
        .collect();

    let report = reconciler.reconcile().unwrap();
    let second: Vec<(String, String)> = vault
        .dest_files()
        .into_iter()
        .map(|f| {
            let content = vault.read_dest(&f);
            (f, content)
        })
        .collect();

    assert_eq!(first, second);
    assert!(report.deleted.is_empty());
    assert!(report.indexes_created.is_empty());
    assert!(!report.changed_structure());
}

#[test]
fn test_every_note_is_published() {
    let vault = TestVault::new();
    for path in ["a.md", "X/b.md", "X/Y/c.md", "Z/d.MD"] {
        vault.note(path, "Body");
    }

    let report = reconciler(&vault).reconcile().unwrap();
    let mut written = report.written.clone();
    written.sort();

    assert_eq!(
        written,
        vec![
            "resources/a.md",
            "resources/x/b.md",
            "resources/x/y/c.md",
            "resources/z/d.md"
        ]
    );
    for path in &report.written {
        vault.assert_dest_exists(path);
    }
}

#[test]
fn test_removed_note_is_deleted_and_siblings_survive() {
    let vault = TestVault::new();
    vault.note("Blog/a.md", "A");
    vault.note("Blog/b.md", "B");
    let reconciler = reconciler(&vault);
    reconciler.reconcile().unwrap();
    let sibling_before = vault.read_dest("resources/blog/b.md");

    vault.remove_note("Blog/a.md");
    let report = reconciler.reconcile().unwrap();

    assert_eq!(report.deleted, vec!["resources/blog/a.md"]);
    vault.assert_dest_not_exists("resources/blog/a.md");
    assert_eq!(vault.read_dest("resources/blog/b.md"), sibling_before);
    vault.assert_dest_exists("resources/blog/_index.md");
}

#[test]
fn test_rename_publishes_new_path_and_removes_old() {
    let vault = TestVault::new();
    vault.note("Old Name.md", "Body");
    let reconciler = reconciler(&vault);
    reconciler.reconcile().unwrap();

    fs::rename(
        vault.source().join("Old Name.md"),
        vault.source().join("New Name.md"),
    )
    .unwrap();
    let report = reconciler.reconcile().unwrap();

    vault.assert_dest_exists("resources/new-name.md");
    vault.assert_dest_not_exists("resources/old-name.md");
    assert_eq!(report.deleted, vec!["resources/old-name.md"]);
}

#[test]
fn test_index_is_never_overwritten() {
    let vault = TestVault::new();
    vault.note("My Folder/a.md", "A");
    let reconciler = reconciler(&vault);
    reconciler.reconcile().unwrap();

    let edited = "+++\ntitle = \"Hand edited\"\n+++\n";
    vault.dest_file("resources/my-folder/_index.md", edited);

    // Renamed folder that normalizes to the same slug
    fs::rename(
        vault.source().join("My Folder"),
        vault.source().join("my folder"),
    )
    .unwrap();
    reconciler.reconcile().unwrap();

    assert_eq!(vault.read_dest("resources/my-folder/_index.md"), edited);
}

#[test]
fn test_orphaned_index_is_not_deleted() {
    let vault = TestVault::new();
    vault.note("Gone/a.md", "A");
    let reconciler = reconciler(&vault);
    reconciler.reconcile().unwrap();

    fs::remove_dir_all(vault.source().join("Gone")).unwrap();
    reconciler.reconcile().unwrap();

    vault.assert_dest_not_exists("resources/gone/a.md");
    vault.assert_dest_exists("resources/gone/_index.md");
}

#[test]
fn test_source_marker_is_copied_once() {
    let vault = TestVault::new();
    vault.note("Docs/_index.md", "---\ntitle: Documentation\n---\n");
    vault.note("Docs/page.md", "Body");
    let reconciler = reconciler(&vault);

    let report = reconciler.reconcile().unwrap();
    assert_eq!(report.markers_copied, vec!["resources/docs/_index.md"]);
    assert!(report.indexes_created.is_empty());
    assert_eq!(
        vault.read_dest("resources/docs/_index.md"),
        "---\ntitle: Documentation\n---\n"
    );

    vault.note("Docs/_index.md", "---\ntitle: Changed\n---\n");
    let report = reconciler.reconcile().unwrap();
    assert!(report.markers_copied.is_empty());
    vault.assert_dest_contains("resources/docs/_index.md", "Documentation");
}

#[test]
fn test_files_outside_managed_root_are_untouched() {
    let vault = TestVault::new();
    vault.dest_file("about.md", "About page");
    vault.dest_file("posts/hello.md", "Hello");
    vault.dest_file("resources/stale.md", "Stale");

    let report = reconciler(&vault).reconcile().unwrap();

    assert_eq!(report.deleted, vec!["resources/stale.md"]);
    assert_eq!(vault.read_dest("about.md"), "About page");
    assert_eq!(vault.read_dest("posts/hello.md"), "Hello");
}

#[rstest]
#[case::image("Blog/photo.png")]
#[case::pdf("paper.pdf")]
#[case::no_extension("README")]
fn test_non_documents_are_ignored(#[case] path: &str) {
    let vault = TestVault::new();
    vault.note(path, "binary-ish");

    let report = reconciler(&vault).reconcile().unwrap();

    assert!(report.written.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn test_hidden_entries_are_skipped() {
    let vault = TestVault::new();
    vault.note(".obsidian/workspace.md", "internal");
    vault.note(".trash/old.md", "deleted");
    vault.note("visible.md", "Body");

    let report = reconciler(&vault).reconcile().unwrap();

    assert_eq!(report.written, vec!["resources/visible.md"]);
}

#[test]
fn test_hidden_entries_included_when_configured() {
    let vault = TestVault::new();
    vault.note(".drafts/a.md", "Body");

    let reconciler = reconciler(&vault).with_options(ReconcileOptions {
        ignore_hidden: false,
        ..ReconcileOptions::default()
    });
    let report = reconciler.reconcile().unwrap();

    assert_eq!(report.written, vec!["resources/drafts/a.md"]);
}

#[test]
fn test_colliding_notes_later_wins() {
    let vault = TestVault::new();
    vault.note("My Post.md", "first");
    vault.note("my-post.md", "second");

    let report = reconciler(&vault).reconcile().unwrap();

    assert_eq!(report.collisions.len(), 1);
    let collision = &report.collisions[0];
    assert_eq!(collision.destination, "resources/my-post.md");
    assert_eq!(collision.winner, "my-post.md");
    vault.assert_dest_contains("resources/my-post.md", "second");
    assert_eq!(vault.dest_files(), vec!["resources/my-post.md"]);
}

fn break_note(vault: &TestVault) {
    // Invalid UTF-8 cannot be read as a note
    fs::write(vault.source().join("Blog/a.md"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
}

#[test]
fn test_unreadable_note_is_omitted_by_default() {
    let vault = TestVault::new();
    vault.note("Blog/a.md", "A");
    vault.note("Blog/b.md", "B");
    let reconciler = reconciler(&vault);
    reconciler.reconcile().unwrap();

    break_note(&vault);
    let report = reconciler.reconcile().unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "Blog/a.md");
    assert!(!report.is_success());
    vault.assert_dest_not_exists("resources/blog/a.md");
    vault.assert_dest_exists("resources/blog/b.md");
}

#[test]
fn test_unreadable_note_keeps_artifact_when_configured() {
    let vault = TestVault::new();
    vault.note("Blog/a.md", "A");
    let mut config = MirrorConfig::new(vault.source(), vault.dest());
    config.failure_policy = FailurePolicy::KeepExisting;
    let reconciler = Reconciler::from_config(&config);
    reconciler.reconcile().unwrap();
    let published = vault.read_dest("resources/blog/a.md");

    break_note(&vault);
    let report = reconciler.reconcile().unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert!(report.deleted.is_empty());
    assert_eq!(vault.read_dest("resources/blog/a.md"), published);
}

#[test]
fn test_malformed_header_still_publishes() {
    let vault = TestVault::new();
    vault.note("broken.md", "---\ntitle: [unclosed\n---\nBody");

    let report = reconciler(&vault).reconcile().unwrap();

    assert!(report.skipped.is_empty());
    vault.assert_dest_contains("resources/broken.md", "title = \"broken\"");
    vault.assert_dest_contains("resources/broken.md", "title: [unclosed");
}

#[test]
fn test_dry_run_changes_nothing() {
    let vault = TestVault::new();
    vault.note("Blog/a.md", "A");
    vault.dest_file("resources/stale.md", "Stale");

    let reconciler = reconciler(&vault).with_options(ReconcileOptions {
        dry_run: true,
        ..ReconcileOptions::default()
    });
    let report = reconciler.reconcile().unwrap();

    assert_eq!(report.written, vec!["resources/blog/a.md"]);
    assert_eq!(report.indexes_created, vec!["resources/blog/_index.md"]);
    assert_eq!(report.deleted, vec!["resources/stale.md"]);
    assert!(report.actions().iter().all(|a| a.starts_with("[dry-run]")));
    assert_eq!(vault.dest_files(), vec!["resources/stale.md"]);
}

#[test]
fn test_multi_language_layout() {
    let vault = TestVault::new();
    vault.note("english/Blog/Hello.md", "Hi");
    vault.note("dutch/Reizen/Dag 1.md", "Hallo");
    vault.note("attachments/ignored.md", "x");
    vault.dest_file("english/resources/old.md", "old");
    vault.dest_file("english/about.md", "keep");

    let mut config = MirrorConfig::new(vault.source(), vault.dest());
    config.languages = vec!["english".to_string(), "dutch".to_string()];
    let reconciler = Reconciler::from_config(&config);

    reconciler.bootstrap().unwrap();
    let report = reconciler.reconcile().unwrap();

    assert_eq!(
        report.written,
        vec!["dutch/resources/reizen/dag-1.md", "english/resources/blog/hello.md"]
    );
    assert_eq!(report.deleted, vec!["english/resources/old.md"]);
    vault.assert_dest_exists("english/resources/blog/_index.md");
    vault.assert_dest_not_exists("attachments");
    assert_eq!(vault.read_dest("english/about.md"), "keep");
}

#[test]
fn test_bootstrap_creates_managed_roots() {
    let vault = TestVault::new();
    let mut config = MirrorConfig::new(vault.source(), vault.dest());
    config.languages = vec!["en".to_string(), "nl".to_string()];

    let created = Reconciler::from_config(&config).bootstrap().unwrap();

    assert_eq!(created.len(), 2);
    assert!(vault.dest().join("en/resources").is_dir());
    assert!(vault.dest().join("nl/resources").is_dir());
}

#[test]
fn test_missing_source_root_fails() {
    let vault = TestVault::new();
    let config = MirrorConfig::new(vault.base().join("nope"), vault.dest());

    let result = Reconciler::from_config(&config).reconcile();
    assert!(matches!(result, Err(mirror_core::Error::SourceRootMissing { .. })));
}
