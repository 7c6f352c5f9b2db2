mod article;
mod citation;
mod digest;
mod theme;
mod warning;

pub use self::article::Article;
pub use self::citation::{CitationRecord, CitationReference, citation_id};
pub use self::digest::{ArticleGroup, Digest};
pub use self::theme::Theme;
pub use self::warning::{CitationWarning, WarningKind};
