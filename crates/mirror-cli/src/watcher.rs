//! Filesystem watcher feeding the debouncer

use std::path::{Component, Path};

use mirror_core::{EventSink, FsEvent, FsEventKind};
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::Result;

/// Whether any component of `path` below `root` starts with a dot.
fn is_hidden(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root).is_ok_and(|relative| {
        relative.components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        })
    })
}

/// Translate a notify event into zero or more aggregator events.
///
/// Renames carry both the old and the new path.
pub fn translate(event: &Event, root: &Path, ignore_hidden: bool) -> Vec<FsEvent> {
    let (kind, folder_hint) = match event.kind {
        EventKind::Create(CreateKind::Folder) => (FsEventKind::Created, true),
        EventKind::Create(_) => (FsEventKind::Created, false),
        EventKind::Modify(ModifyKind::Name(_)) => (FsEventKind::Moved, false),
        EventKind::Modify(_) => (FsEventKind::Modified, false),
        EventKind::Remove(RemoveKind::Folder) => (FsEventKind::Deleted, true),
        EventKind::Remove(_) => (FsEventKind::Deleted, false),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| !(ignore_hidden && is_hidden(root, path)))
        .map(|path| FsEvent {
            path: path.clone(),
            kind,
            is_directory: folder_hint || path.is_dir(),
        })
        .collect()
}

/// Watch `root` recursively, submitting every event to `sink`.
///
/// Watching stops when the returned watcher is dropped.
pub fn watch(root: &Path, ignore_hidden: bool, sink: EventSink) -> Result<RecommendedWatcher> {
    let watch_root = root.to_path_buf();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        match result {
            Ok(event) => {
                for fs_event in translate(&event, &watch_root, ignore_hidden) {
                    sink.submit(fs_event);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Filesystem watcher error"),
        }
    })?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    tracing::info!(path = %root.display(), "Watching for changes");
    Ok(watcher)
}
