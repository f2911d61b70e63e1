//! Error types for mirror-content

/// Result type for mirror-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-content operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse {format} header: {message}")]
    ParseError { format: String, message: String },

    #[error("{format} header is not a key/value mapping")]
    NotAMapping { format: String },

    #[error("Failed to render header: {0}")]
    Render(#[from] toml::ser::Error),
}

impl Error {
    pub fn parse(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            format: format.into(),
            message: message.into(),
        }
    }
}
