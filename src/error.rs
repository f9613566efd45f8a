use crate::content::{ClassLevel, ItemKind};
use std::time::Duration;
use thiserror::Error;

/// User-facing practice failures. Every variant is recoverable: the caller
/// turns it into a retry prompt and the session carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PracticeError {
    #[error("Recognition is turned off or no result found")]
    NoRecognitionAvailable,

    #[error("You wrote \"{recognized}\" but the answer was \"{expected}\"")]
    Mismatch { recognized: String, expected: String },

    #[error("No {kind}s available for class {level}")]
    EmptyContentPool { level: ClassLevel, kind: ItemKind },

    #[error("Too many attempts, try again in {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid content file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown class level {0} in content file")]
    UnknownLevel(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare history directory: {0}")]
    Io(#[from] std::io::Error),
}
