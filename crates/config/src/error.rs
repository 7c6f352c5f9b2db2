//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    #[display("unsupported config file format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The merged sources couldn't be read into a [`Config`](crate::Config).
    #[display("could not read configuration")]
    Load,
    #[display("invalid value for {_0}")]
    InvalidValue(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Configuration errors need a human to fix them; retrying never helps.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
