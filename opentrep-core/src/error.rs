use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for the query resolution pipeline (indexer + matcher).
///
/// `ParseError` is recoverable: the index builder skips the offending line
/// and increments a counter instead of propagating it. Every other variant
/// surfaces to the caller.
#[derive(Debug, Error)]
pub enum OpenTrepError {
    #[error("POR file not found or unreadable: {0}")]
    FileNotFound(PathBuf),

    #[error("malformed POR line {line}: {reason}")]
    ParseError { line: u64, reason: String },

    #[error("failed to write to the persistent index: {0}")]
    IndexWriteError(#[source] heed::Error),

    #[error("failed to read the persistent index: {0}")]
    IndexReadError(#[source] heed::Error),

    #[error("no slice of the query produced a non-empty match")]
    NoBestMatch,

    #[error("query is empty or contains only separators")]
    InvalidQuery,

    #[error("query resolution was cancelled")]
    Cancelled,
}

pub type OpenTrepResult<T> = Result<T, OpenTrepError>;

impl From<heed::Error> for OpenTrepError {
    fn from(error: heed::Error) -> OpenTrepError {
        OpenTrepError::IndexReadError(error)
    }
}
