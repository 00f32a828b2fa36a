//! Error types for diff replay.

use bgd_types::ChangeType;

/// Fatal replay failures.
///
/// These indicate a malformed diff artifact, not a conflict with the base
/// document; conflicts are recoverable and land in the apply report.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApplyError {
    /// An item lacks the payload its effective operation requires.
    #[error("diff item {index} ({change}) is missing its {side} payload")]
    MissingPayload {
        index: usize,
        change: ChangeType,
        side: &'static str,
    },

    /// An item's payload does not have the native entry shape.
    #[error("diff item {index} has a malformed payload: {reason}")]
    MalformedPayload { index: usize, reason: String },
}

/// Convenience alias for replay results.
pub type ApplyResult<T> = Result<T, ApplyError>;
