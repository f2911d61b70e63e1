//! Reconciler implementation

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use mirror_content::{DOCUMENT_EXTENSION, FolderIndex, INDEX_FILE_NAME, Transformer};
use mirror_fs::{NormalizedPath, RobustnessConfig, io};
use walkdir::{DirEntry, WalkDir};

use super::report::{Collision, ReconcileReport, SkippedFile};
use crate::config::{FailurePolicy, MirrorConfig};
use crate::layout::Layout;
use crate::{Error, Result};

/// Options for a reconciliation pass
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// If true, compute the full report without touching the destination.
    /// Actions are reported as "[dry-run] Would ..."
    pub dry_run: bool,
    pub failure_policy: FailurePolicy,
    /// Skip source entries whose name starts with `.`
    pub ignore_hidden: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            failure_policy: FailurePolicy::Omit,
            ignore_hidden: true,
        }
    }
}

/// Mirrors a source vault into the destination layout.
///
/// Every pass re-reads the whole source tree; nothing is cached between
/// passes.
#[derive(Debug, Clone)]
pub struct Reconciler {
    source_root: PathBuf,
    layout: Layout,
    transformer: Transformer,
    options: ReconcileOptions,
    robustness: RobustnessConfig,
}

/// Mutable state of one pass.
struct Pass {
    report: ReconcileReport,
    /// Destination path -> source path that produced it
    origins: HashMap<NormalizedPath, NormalizedPath>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_document(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

impl Reconciler {
    pub fn new(source_root: impl Into<PathBuf>, layout: Layout, transformer: Transformer) -> Self {
        Self {
            source_root: source_root.into(),
            layout,
            transformer,
            options: ReconcileOptions::default(),
            robustness: RobustnessConfig::default(),
        }
    }

    pub fn from_config(config: &MirrorConfig) -> Self {
        Self::new(&config.source_root, config.layout(), config.transformer()).with_options(
            ReconcileOptions {
                dry_run: false,
                failure_policy: config.failure_policy,
                ignore_hidden: config.ignore_hidden,
            },
        )
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Create every managed root that does not exist yet.
    ///
    /// Returns the roots that were created.
    pub fn bootstrap(&self) -> Result<Vec<NormalizedPath>> {
        let mut created = Vec::new();
        for root in self.layout.managed_roots() {
            let native = self.layout.to_native(&root);
            if native.is_dir() {
                continue;
            }
            if !self.options.dry_run {
                fs::create_dir_all(&native).map_err(|e| mirror_fs::Error::io(&native, e))?;
                tracing::info!(path = %native.display(), "Created managed root");
            }
            created.push(root);
        }
        Ok(created)
    }

    /// Run one full pass.
    ///
    /// Only a missing source root fails the pass; per-file problems are
    /// recorded in the report.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        if !self.source_root.is_dir() {
            return Err(Error::SourceRootMissing {
                path: self.source_root.clone(),
            });
        }

        let mut pass = Pass {
            report: ReconcileReport::new(self.options.dry_run),
            origins: HashMap::new(),
        };

        let ignore_hidden = self.options.ignore_hidden;
        let walker = WalkDir::new(&self.source_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(ignore_hidden && is_hidden(e)));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Typically a folder removed while walking
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    tracing::warn!(path = %path, error = %e, "Skipping unreadable source entry");
                    pass.report.skipped.push(SkippedFile {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let Some(relative) = NormalizedPath::relative(&self.source_root, entry.path()) else {
                continue;
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                self.visit_folder(&relative, entry.path(), &mut pass);
            } else if file_type.is_file() {
                self.visit_file(&relative, entry.path(), &mut pass);
            } else {
                tracing::debug!(path = %relative, "Ignoring non-regular source entry");
            }
        }

        self.delete_orphans(&mut pass);

        let report = pass.report;
        tracing::info!(
            dry_run = report.dry_run,
            summary = %report.summary(),
            "Reconciliation pass complete"
        );
        Ok(report)
    }

    fn visit_folder(&self, relative: &NormalizedPath, native: &Path, pass: &mut Pass) {
        let Some(dest) = self.layout.folder_destination(relative) else {
            if !relative.is_empty() && relative.parent().is_some_and(|p| p.is_empty()) {
                tracing::info!(path = %relative, "Skipping folder outside configured languages");
            }
            return;
        };

        let dest_native = self.layout.to_native(&dest);
        if !dest_native.is_dir() {
            if !self.options.dry_run
                && let Err(e) = fs::create_dir_all(&dest_native)
            {
                tracing::warn!(path = %dest, error = %e, "Failed to create destination folder");
                pass.report.skipped.push(SkippedFile {
                    path: relative.to_string(),
                    message: e.to_string(),
                });
                return;
            }
            pass.report.folders_created.push(dest.to_string());
        }

        let index = dest.join(INDEX_FILE_NAME);
        let index_native = NormalizedPath::new(self.layout.to_native(&index));
        pass.report.produced.insert(index.clone());

        let marker = native.join(INDEX_FILE_NAME);
        if marker.is_file() {
            match self.copy_marker(&marker, &index_native) {
                Ok(true) => {
                    tracing::debug!(path = %index, "Copied index marker");
                    pass.report.markers_copied.push(index.to_string());
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(path = %relative, error = %e, "Failed to copy index marker");
                    pass.report.skipped.push(SkippedFile {
                        path: relative.join(INDEX_FILE_NAME).to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        // The vault root maps onto the resources root, which carries only a
        // copied marker. Language folders are titled by their own name.
        if relative.is_empty() {
            return;
        }

        let folder_name = relative.file_name().unwrap_or_default();
        let category = self
            .transformer
            .classifier()
            .classify(&relative.to_native());
        match self.create_index(&FolderIndex::new(folder_name, category), &index_native) {
            Ok(true) => {
                tracing::debug!(path = %index, "Created folder index");
                pass.report.indexes_created.push(index.to_string());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(path = %index, error = %e, "Failed to create folder index");
                pass.report.skipped.push(SkippedFile {
                    path: relative.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn copy_marker(&self, marker: &Path, index: &NormalizedPath) -> Result<bool> {
        if self.options.dry_run {
            return Ok(!index.to_native().exists());
        }
        Ok(io::copy_if_absent(marker, index)?)
    }

    fn create_index(&self, folder_index: &FolderIndex, index: &NormalizedPath) -> Result<bool> {
        if self.options.dry_run {
            return Ok(!index.to_native().exists());
        }
        let rendered = folder_index.render()?;
        Ok(io::write_if_absent(index, rendered.as_bytes())?)
    }

    fn visit_file(&self, relative: &NormalizedPath, native: &Path, pass: &mut Pass) {
        let Some(file_name) = relative.file_name() else {
            return;
        };

        if file_name == INDEX_FILE_NAME {
            tracing::debug!(path = %relative, "Index marker handled with its folder");
            return;
        }

        if !is_document(file_name) {
            tracing::debug!(path = %relative, "Ignoring non-document file");
            return;
        }

        let Some(dest) = self.layout.document_destination(relative) else {
            tracing::debug!(path = %relative, "Ignoring note outside configured languages");
            return;
        };

        if let Some(previous) = pass.origins.insert(dest.clone(), relative.clone()) {
            tracing::warn!(
                destination = %dest,
                replaced = %previous,
                winner = %relative,
                "Two notes publish to the same path; the later one wins"
            );
            pass.report.collisions.push(Collision {
                destination: dest.to_string(),
                replaced: previous.to_string(),
                winner: relative.to_string(),
            });
        }

        match self.publish_document(relative, native, &dest) {
            Ok(()) => {
                tracing::debug!(source = %relative, destination = %dest, "Published note");
                pass.report.written.push(dest.to_string());
                pass.report.produced.insert(dest);
            }
            Err(e) => {
                tracing::warn!(path = %relative, error = %e, "Skipping note");
                pass.report.skipped.push(SkippedFile {
                    path: relative.to_string(),
                    message: e.to_string(),
                });
                if self.options.failure_policy == FailurePolicy::KeepExisting {
                    pass.report.produced.insert(dest);
                }
            }
        }
    }

    fn publish_document(
        &self,
        relative: &NormalizedPath,
        native: &Path,
        dest: &NormalizedPath,
    ) -> Result<()> {
        let bytes = fs::read(native).map_err(|e| mirror_fs::Error::io(native, e))?;
        let raw = String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 {
            path: native.to_path_buf(),
        })?;

        let folder = relative.parent().unwrap_or_default();
        let (rendered, header_error) =
            self.transformer
                .render(native, &raw, &folder.to_native())?;
        if let Some(reason) = header_error {
            tracing::warn!(path = %relative, reason = %reason, "Discarded malformed header");
        }

        if self.options.dry_run {
            return Ok(());
        }
        let dest_native = NormalizedPath::new(self.layout.to_native(dest));
        io::write_atomic(&dest_native, rendered.as_bytes(), self.robustness)?;
        Ok(())
    }

    /// Delete every file under a managed root that this pass did not
    /// produce. Index markers are never deleted.
    fn delete_orphans(&self, pass: &mut Pass) {
        for root in self.layout.managed_roots() {
            let root_native = self.layout.to_native(&root);
            if !root_native.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&root_native).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unreadable destination entry");
                        continue;
                    }
                };
                if entry.file_type().is_dir() {
                    continue;
                }
                if entry.file_name().to_string_lossy() == INDEX_FILE_NAME {
                    continue;
                }

                let Some(relative) = NormalizedPath::relative(self.layout.dest_root(), entry.path())
                else {
                    continue;
                };
                if pass.report.produced.contains(&relative) {
                    continue;
                }

                if self.options.dry_run {
                    pass.report.deleted.push(relative.to_string());
                    continue;
                }
                match io::remove_file(&NormalizedPath::new(entry.path())) {
                    Ok(_) => {
                        tracing::debug!(path = %relative, "Deleted orphaned artifact");
                        pass.report.deleted.push(relative.to_string());
                    }
                    Err(e) => {
                        tracing::warn!(path = %relative, error = %e, "Failed to delete orphaned artifact");
                        pass.report.skipped.push(SkippedFile {
                            path: relative.to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }
    }
}
