//! Error types shared across the BGD workspace.

use std::path::PathBuf;

/// Errors from parsing or constructing foundation types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypeError {
    /// A fingerprint string was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// A fingerprint had the wrong byte length.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors from reading or parsing a project document.
///
/// These are fatal to the enclosing comparison: a document that cannot be
/// read or parsed admits no partial diff.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The document could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document metadata was not valid JSON for the expected shape.
    #[error("failed to parse project document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias for document results.
pub type DocumentResult<T> = Result<T, DocumentError>;
