//! Content transformation for vault-mirror
//!
//! Turns a note from the source vault into its published form:
//!
//! - [`slug`]: URL-safe names for folders and files
//! - [`header`]: front matter parsing (YAML `---` or TOML `+++`) and rendering
//! - [`transform`]: body rewriting and title/type derivation
//! - [`index`]: folder index placeholders

pub mod error;
pub mod header;
pub mod index;
pub mod slug;
pub mod transform;

pub use error::{Error, Result};
pub use header::{Header, HeaderFormat, ParsedDocument, parse_document, render_document};
pub use index::{FolderIndex, INDEX_FILE_NAME};
pub use slug::{DOCUMENT_EXTENSION, FALLBACK_SLUG, slugify, slugify_file_name, slugify_segments};
pub use transform::{Classifier, TransformedDocument, Transformer, transform_body};
