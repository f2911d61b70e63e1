//! Destination layout: where source paths land in the content tree
//!
//! Single-language vaults publish into `<dest>/<resources_dir>/...`. In
//! multi-language mode the first source segment names the language and
//! notes publish into `<dest>/<lang>/<resources_dir>/...`.

use std::path::{Path, PathBuf};

use mirror_content::{INDEX_FILE_NAME, slugify_file_name, slugify_segments};
use mirror_fs::NormalizedPath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    dest_root: PathBuf,
    resources_dir: String,
    languages: Vec<String>,
}

impl Layout {
    pub fn new(dest_root: impl Into<PathBuf>, resources_dir: &str) -> Self {
        Self {
            dest_root: dest_root.into(),
            resources_dir: resources_dir.to_string(),
            languages: Vec::new(),
        }
    }

    /// Enable multi-language mode; an empty list disables it.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    pub fn is_multi_language(&self) -> bool {
        !self.languages.is_empty()
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// The managed subtrees, relative to the destination root.
    ///
    /// Only files below these roots are ever deleted.
    pub fn managed_roots(&self) -> Vec<NormalizedPath> {
        if self.is_multi_language() {
            self.languages
                .iter()
                .map(|lang| NormalizedPath::root().join(lang).join(&self.resources_dir))
                .collect()
        } else {
            vec![NormalizedPath::root().join(&self.resources_dir)]
        }
    }

    pub fn is_managed_root(&self, dest: &NormalizedPath) -> bool {
        self.managed_roots().contains(dest)
    }

    /// Split a source-relative path into its managed root and the segments
    /// below it.
    fn route<'a>(&self, source: &'a NormalizedPath) -> Option<(NormalizedPath, Vec<&'a str>)> {
        let mut segments = source.segments();
        if self.is_multi_language() {
            let lang = segments.next()?;
            if !self.languages.iter().any(|l| l == lang) {
                return None;
            }
            let root = NormalizedPath::root().join(lang).join(&self.resources_dir);
            Some((root, segments.collect()))
        } else {
            let root = NormalizedPath::root().join(&self.resources_dir);
            Some((root, segments.collect()))
        }
    }

    /// Destination folder for a source folder, relative to the destination
    /// root. `None` when the folder is outside every managed root.
    pub fn folder_destination(&self, source_folder: &NormalizedPath) -> Option<NormalizedPath> {
        let (root, segments) = self.route(source_folder)?;
        Some(
            slugify_segments(segments)
                .iter()
                .fold(root, |path, segment| path.join(segment)),
        )
    }

    /// Destination artifact for a source note.
    pub fn document_destination(&self, source_file: &NormalizedPath) -> Option<NormalizedPath> {
        let file_name = source_file.file_name()?;
        let folder = self.folder_destination(&source_file.parent()?)?;
        Some(folder.join(&slugify_file_name(file_name)))
    }

    /// Index marker of the destination folder for a source folder.
    pub fn index_destination(&self, source_folder: &NormalizedPath) -> Option<NormalizedPath> {
        Some(self.folder_destination(source_folder)?.join(INDEX_FILE_NAME))
    }

    /// Resolve a destination-relative path to a native path.
    pub fn to_native(&self, dest: &NormalizedPath) -> PathBuf {
        dest.under(&self.dest_root)
    }
}
