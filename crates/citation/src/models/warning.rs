use derive_more::Display;
use std::fmt::{Formatter, Result as FmtResult};

/// Why a citation could not be tied to an article.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// The marker's URL matches none of the digest's articles.
    #[display("unknown URL")]
    UnknownUrl,
    /// The marker's number is outside the digest's article list.
    #[display("number out of range")]
    OutOfRange,
    /// The number is referenced, but never with a URL attached.
    #[display("never linked")]
    Unlinked,
}

/// A non-fatal problem found while checking a digest's citations.
///
/// Warnings are data for the caller to log or display; they never block
/// storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationWarning {
    pub number: u32,
    pub url: Option<String>,
    pub kind: WarningKind,
}

impl std::fmt::Display for CitationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "citation [{}]: {}", self.number, self.kind)?;
        match &self.url {
            Some(url) => write!(f, " ({})", url),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let warning = CitationWarning {
            number: 2,
            url: Some("https://unknown.com".to_string()),
            kind: WarningKind::UnknownUrl,
        };
        assert_eq!(warning.to_string(), "citation [2]: unknown URL (https://unknown.com)");
        let warning = CitationWarning { number: 5, url: None, kind: WarningKind::Unlinked };
        assert_eq!(warning.to_string(), "citation [5]: never linked");
    }
}
