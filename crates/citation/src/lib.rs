//! Citation markers in generated digests.
//!
//! Digest summaries are markdown written by a language model, citing their
//! source articles by position: `[[2]]` (or `[2]`) means "the second article
//! of this digest". This crate finds those markers, fills in article URLs,
//! and turns them into [`CitationRecord`]s that can be stored alongside the
//! digest. It performs no I/O; persistence lives in `digestr-store`.
//!
//! # Overview
//! - [`CitationParser`]: finds markers and captures the text around them.
//! - [`CitationResolver`]: maps markers onto [`Article`]s, produces records,
//!   and checks digests for citations that point nowhere.
//!
//! The free functions below use default settings and no logging span, for
//! callers that don't need either.

mod consts;
pub mod error;
pub mod models;
mod parser;
mod resolver;

pub use crate::consts::{DEFAULT_MAX_CONTEXT, DEFAULT_MIN_CONTEXT};
pub use crate::models::{
    Article, ArticleGroup, CitationRecord, CitationReference, CitationWarning, Digest, Theme, WarningKind,
};
pub use crate::parser::{CitationParser, ContextWindow, format_citation_number};
pub use crate::resolver::{ArticlesByUrl, CitationAudit, CitationResolver, Resolution, articles_by_url};

/// See [`CitationParser::extract_citations`].
pub fn extract_citations(text: &str) -> Vec<CitationReference> {
    CitationParser::default().extract_citations(text)
}

/// See [`CitationParser::parse_citation_numbers`].
pub fn parse_citation_numbers(text: &str) -> Vec<u32> {
    CitationParser::default().parse_citation_numbers(text)
}

/// See [`CitationParser::count_citations`].
pub fn count_citations(text: &str) -> usize {
    CitationParser::default().count_citations(text)
}

/// See [`CitationResolver::inject_citation_urls`].
pub fn inject_citation_urls(markdown: &str, articles: &[Article]) -> String {
    CitationResolver::default().inject_citation_urls(markdown, articles)
}

/// See [`CitationResolver::build_citation_records`].
pub fn build_citation_records(
    digest_id: &str,
    references: &[CitationReference],
    articles: &ArticlesByUrl<'_>,
) -> Vec<CitationRecord> {
    CitationResolver::default().build_citation_records(digest_id, references, articles)
}

/// See [`CitationResolver::validate_citations`].
pub fn validate_citations(markdown: &str, articles: &[Article]) -> Vec<CitationWarning> {
    CitationResolver::default().validate_citations(markdown, articles)
}
