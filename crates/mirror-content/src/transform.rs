//! Note transformation: body rewriting and header derivation

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::header::{Header, parse_document, render_document};

/// `[[target]]` cross-references
static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]]+)\]\]").expect("Invalid wiki link regex")
});

/// `^abc123` block-reference tags, stripped from bodies and file names
pub(crate) static BLOCK_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\^\w+").expect("Invalid block reference regex")
});

/// `==text==` highlight spans, never crossing a line break
static HIGHLIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"==(.*?)==").expect("Invalid highlight regex")
});

const TITLE_KEY: &str = "title";
const META_TITLE_KEY: &str = "meta_title";
const TYPE_KEY: &str = "type";

/// Rewrite `[[target]]` into `[target](target)`.
///
/// Purely syntactic; targets are not resolved against the published tree.
pub fn convert_links(body: &str) -> String {
    WIKI_LINK.replace_all(body, "[$1]($1)").into_owned()
}

/// Strip block-reference tags and turn highlights into `<mark>` spans.
pub fn clean_body(body: &str) -> String {
    let stripped = BLOCK_REF.replace_all(body, "");
    HIGHLIGHT
        .replace_all(&stripped, "<mark>$1</mark>")
        .into_owned()
}

/// Apply every body rewrite in order: links, block refs, highlights.
pub fn transform_body(body: &str) -> String {
    clean_body(&convert_links(body))
}

/// Decides the `type` classification from folder membership.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Lowercased category names, in priority order
    categories: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(["blog"])
    }
}

impl Classifier {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(|c| c.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// The first category, in configured order, that names a segment of
    /// `relative_folder` (case-insensitive).
    pub fn classify(&self, relative_folder: &Path) -> Option<&str> {
        let segments: Vec<String> = relative_folder
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().to_lowercase()),
                _ => None,
            })
            .collect();

        self.categories
            .iter()
            .find(|category| segments.iter().any(|s| s == *category))
            .map(String::as_str)
    }
}

/// Header and body of a published document.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedDocument {
    pub header: Header,
    pub body: String,
}

impl TransformedDocument {
    /// Serialize to the published text form.
    pub fn render(&self) -> Result<String> {
        render_document(&self.header, &self.body)
    }
}

/// Turns source notes into published documents.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    classifier: Classifier,
}

impl Transformer {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Transform one note.
    ///
    /// * `source_path` - path of the note; its stem is the fallback title
    /// * `header` - parsed source header
    /// * `body` - source body
    /// * `relative_folder` - folder of the note relative to the vault root
    pub fn transform(
        &self,
        source_path: &Path,
        mut header: Header,
        body: &str,
        relative_folder: &Path,
    ) -> TransformedDocument {
        let title = header.get(TITLE_KEY).cloned().unwrap_or_else(|| {
            let stem = source_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            toml::Value::String(stem)
        });
        header.insert(TITLE_KEY.to_string(), title.clone());
        header.insert(META_TITLE_KEY.to_string(), title);

        match self.classifier.classify(relative_folder) {
            Some(category) => {
                header.insert(
                    TYPE_KEY.to_string(),
                    toml::Value::String(category.to_string()),
                );
            }
            None => {
                header.remove(TYPE_KEY);
            }
        }

        TransformedDocument {
            header,
            body: transform_body(body),
        }
    }

    /// Parse, transform, and render a raw note in one step.
    ///
    /// Returns the rendered text and, if the source header had to be
    /// discarded, the reason.
    pub fn render(
        &self,
        source_path: &Path,
        raw: &str,
        relative_folder: &Path,
    ) -> Result<(String, Option<String>)> {
        let parsed = parse_document(raw);
        let transformed = self.transform(source_path, parsed.header, &parsed.body, relative_folder);
        Ok((transformed.render()?, parsed.header_error))
    }
}
