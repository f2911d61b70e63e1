//! End-to-end scenarios: vault edits flow through the debouncer, the
//! reconciler, and the publish gate into a bare remote.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mirror_content::{Classifier, Transformer, parse_document};
use mirror_core::{
    ChangeAggregator, Debouncer, FsEvent, FsEventKind, Layout, MirrorConfig, MirrorDaemon,
    Reconciler,
};
use mirror_fs::NormalizedPath;
use mirror_test_utils::git::RemoteFixture;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Site {
    _temp: TempDir,
    fixture: RemoteFixture,
    vault: PathBuf,
}

impl Site {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let fixture = RemoteFixture::new(temp.path());
        let vault = temp.path().join("vault");
        fs::create_dir_all(&vault).unwrap();
        Self {
            _temp: temp,
            fixture,
            vault,
        }
    }

    fn config(&self) -> MirrorConfig {
        MirrorConfig::new(&self.vault, self.fixture.work.join("content"))
    }

    fn write(&self, relative: &str, content: &str) -> FsEvent {
        let path = self.vault.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        FsEvent::new(path, FsEventKind::Modified)
    }
}

#[tokio::test(start_paused = true)]
async fn test_edit_burst_is_published_once() {
    let site = Site::new();
    let config = site.config();
    let daemon = MirrorDaemon::new(config.clone()).unwrap();
    daemon.bootstrap().unwrap();
    let initial_head = site.fixture.remote_head();

    let aggregator = Arc::new(ChangeAggregator::new(config.debounce()));
    let debouncer = Debouncer::new(Arc::clone(&aggregator), daemon);
    let sink = debouncer.sink();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let driver = tokio::spawn(debouncer.run_until(async move {
        let _ = stopped.await;
    }));

    sink.submit(site.write("Blog/First Post.md", "---\ntitle: First\n---\nHello"));
    tokio::time::sleep(Duration::from_secs(20)).await;
    sink.submit(site.write("Blog/First Post.md", "---\ntitle: First\n---\nHello again"));
    tokio::time::sleep(Duration::from_secs(20)).await;
    sink.submit(site.write("Notes/Idea.md", "An ==important== idea ^id1"));
    tokio::time::sleep(Duration::from_secs(600)).await;

    stop.send(()).unwrap();
    let passes = driver.await.unwrap().unwrap();
    assert_eq!(passes, 1);

    assert_ne!(site.fixture.remote_head(), initial_head);
    assert_eq!(
        site.fixture.remote_head_message().trim_end(),
        "Auto-commit from vault-mirror - Updated files:\nBlog/First Post.md\nNotes/Idea.md"
    );

    let files = site.fixture.remote_files();
    for expected in [
        "content/resources/blog/_index.md",
        "content/resources/blog/first-post.md",
        "content/resources/notes/_index.md",
        "content/resources/notes/idea.md",
    ] {
        assert!(files.contains(&expected.to_string()), "missing {expected}");
    }

    let idea =
        fs::read_to_string(site.fixture.work.join("content/resources/notes/idea.md")).unwrap();
    assert!(idea.ends_with("An <mark>important</mark> idea "));
}

#[test]
fn test_publish_failure_leaves_files_for_next_pass() {
    let site = Site::new();
    site.write("a.md", "A");

    let mut config = site.config();
    config.remote = "missing".to_string();
    let daemon = MirrorDaemon::new(config).unwrap();
    assert!(daemon.run_pass(&Default::default()).is_err());
    assert!(site.fixture.work.join("content/resources/a.md").exists());

    let daemon = MirrorDaemon::new(site.config()).unwrap();
    let outcome = daemon.run_pass(&Default::default()).unwrap();
    assert!(outcome.publish.unwrap().pushed);
    assert!(
        site.fixture
            .remote_files()
            .contains(&"content/resources/a.md".to_string())
    );
}

#[test]
fn test_published_documents_round_trip_their_header() {
    let site = Site::new();
    site.write(
        "english/Blog/Trip.md",
        "---\ntitle: Trip\ndate: 2024-05-01\ntags: [travel, notes]\ndraft: false\n---\nBody",
    );

    let layout = Layout::new(site.fixture.work.join("content"), "resources")
        .with_languages(vec!["english".to_string()]);
    let reconciler = Reconciler::new(
        &site.vault,
        layout,
        Transformer::new(Classifier::new(["blog"])),
    );
    reconciler.bootstrap().unwrap();
    let report = reconciler.reconcile().unwrap();

    assert!(
        report
            .produced
            .contains(&NormalizedPath::new("english/resources/blog/trip.md"))
    );
    let published = fs::read_to_string(
        site.fixture
            .work
            .join("content/english/resources/blog/trip.md"),
    )
    .unwrap();

    let parsed = parse_document(&published);
    assert_eq!(parsed.body, "Body");
    assert_eq!(parsed.header["title"].as_str(), Some("Trip"));
    assert_eq!(parsed.header["meta_title"].as_str(), Some("Trip"));
    assert_eq!(parsed.header["type"].as_str(), Some("blog"));
    assert_eq!(parsed.header["draft"].as_bool(), Some(false));
    assert!(parsed.header["date"].is_datetime());
    assert_eq!(parsed.header["tags"].as_array().map(Vec::len), Some(2));
}
