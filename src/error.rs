//! Error types for content resolution

/// Errors raised while talking to the content source or shaping its documents.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// No document of the given type carries the requested uid.
    #[error("{doc_type} not found: {uid}")]
    NotFound { doc_type: String, uid: String },

    /// The content source could not be reached.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The content source answered with a non-success status.
    #[error("content API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Reading a local export failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentError {
    /// Whether this error means the requested document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
