//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. The underlying `sqlx` error is kept
//! as a child frame of whichever [`ErrorKind`] is raised over it.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The stage of a digest write that failed.
///
/// Whatever the step, the whole write has been rolled back by the time the
/// error reaches the caller.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    #[display("begin")]
    Begin,
    #[display("digest upsert")]
    Digest,
    #[display("article links")]
    ArticleLinks,
    #[display("theme links")]
    ThemeLinks,
    #[display("citations")]
    Citations,
    #[display("commit")]
    Commit,
}

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    #[display("digest not found: {_0}")]
    DigestNotFound(#[error(not(source))] String),
    /// Serialization/deserialization error, or input that can't be stored.
    #[display("invalid data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// A digest write failed and was rolled back.
    #[display("digest write failed at step: {_0}")]
    Transaction(#[error(not(source))] WriteStep),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Digest writes take the write lock as they begin, so another writer
    /// holding it surfaces as a failed `Begin`. That, and a failed `Commit`,
    /// can go away. Every other failure will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transaction(WriteStep::Begin | WriteStep::Commit))
    }
}
