//! Citation Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Parsing and resolution never fail on user text (a marker that doesn't
//! match is simply not a marker), so the only errors here come from building
//! a parser with nonsensical settings.

use derive_more::{Display, Error};

/// A citation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for citation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The context window bounds are unusable (zero-sized, or inverted).
    #[display("invalid citation context window: min {min}, max {max}")]
    InvalidContextWindow {
        /// Requested minimum context length, in characters.
        min: usize,
        /// Requested maximum context length, in characters.
        max: usize,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Settings are either valid or they aren't.
        false
    }
}
