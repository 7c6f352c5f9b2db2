mod article;
mod citation;
mod digest;
mod facet;
mod theme;

pub use self::article::NewArticle;
pub(crate) use self::article::ArticleRow;
pub(crate) use self::citation::CitationRow;
pub use self::digest::PersistedDigest;
pub(crate) use self::digest::DigestRow;
pub(crate) use self::theme::ThemeRow;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::UtcDateTime;

/// Timestamps are stored as Unix seconds; sub-second precision is dropped.
pub(crate) fn from_timestamp(timestamp: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(timestamp).or_raise(|| ErrorKind::InvalidData(field))
}
