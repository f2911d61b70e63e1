//! Folder index placeholders

use serde::Serialize;

use crate::error::Result;
use crate::header::HeaderFormat;

/// File name of folder index markers, in source and destination alike.
pub const INDEX_FILE_NAME: &str = "_index.md";

/// Header-only document created once per published folder.
///
/// The title keeps the original folder name, not its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderIndex {
    pub title: String,
    pub meta_title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl FolderIndex {
    pub fn new(folder_name: &str, category: Option<&str>) -> Self {
        Self {
            title: folder_name.to_string(),
            meta_title: folder_name.to_string(),
            kind: category.map(str::to_string),
        }
    }

    /// Render as a fenced header block with no body.
    pub fn render(&self) -> Result<String> {
        let fence = HeaderFormat::Toml.fence();
        let rendered = toml::to_string(self)?;
        Ok(format!("{fence}\n{rendered}{fence}\n"))
    }
}
