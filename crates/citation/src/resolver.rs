//! Resolving parsed citation markers against real articles.
//!
//! Resolution is deliberately forgiving: a marker pointing at an unknown URL
//! or a number past the end of the article list is never an error. Such
//! markers are left untouched in rendered text, dropped from persisted
//! records, and reported as [`CitationWarning`]s by the validation helpers.

use std::collections::{HashMap, HashSet};
use time::UtcDateTime;
use tracing::{Span, instrument};

use crate::consts;
use crate::models::{Article, CitationRecord, CitationReference, CitationWarning, WarningKind, citation_id};
use crate::parser::CitationParser;

/// URL → article lookup used to resolve URL-bearing markers.
pub type ArticlesByUrl<'a> = HashMap<&'a str, &'a Article>;

/// Builds the URL → article lookup for a set of articles.
///
/// If two articles share a URL (which the article store forbids), the first
/// one wins.
pub fn articles_by_url<'a>(articles: impl IntoIterator<Item = &'a Article>) -> ArticlesByUrl<'a> {
    let mut map = HashMap::new();
    for article in articles {
        map.entry(article.url.as_str()).or_insert(article);
    }
    map
}

/// Outcome of resolving a list of references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// One record per reference whose URL matched an article.
    pub records: Vec<CitationRecord>,
    /// References that matched nothing and were left out of `records`.
    pub dropped: Vec<CitationReference>,
}

/// Result of a completeness check over every number a text references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationAudit {
    /// Every referenced number, deduplicated, in order of first appearance.
    pub referenced: Vec<u32>,
    /// Numbers with no article at that position.
    pub out_of_range: Vec<u32>,
    /// In-range numbers that are only ever cited bare (no URL anywhere).
    pub unlinked: Vec<u32>,
}
impl CitationAudit {
    /// Returns `true` if every referenced number is in range and linked.
    pub fn is_complete(&self) -> bool {
        self.out_of_range.is_empty() && self.unlinked.is_empty()
    }

    pub fn warnings(&self) -> Vec<CitationWarning> {
        let out_of_range = self.out_of_range.iter().map(|n| CitationWarning {
            number: *n,
            url: None,
            kind: WarningKind::OutOfRange,
        });
        let unlinked = self.unlinked.iter().map(|n| CitationWarning {
            number: *n,
            url: None,
            kind: WarningKind::Unlinked,
        });
        out_of_range.chain(unlinked).collect()
    }
}

/// Ties citation markers to articles.
#[derive(Debug, Clone)]
pub struct CitationResolver {
    parser: CitationParser,
    span: Span,
}
impl Default for CitationResolver {
    fn default() -> Self {
        Self::new(CitationParser::default(), Span::none())
    }
}
impl CitationResolver {
    pub fn new(parser: CitationParser, span: Span) -> Self {
        Self { parser, span }
    }

    pub fn parser(&self) -> &CitationParser {
        &self.parser
    }

    /// Rewrites bare `[[N]]` markers into `[[N]](URL)`, where URL is the
    /// N-th article's URL.
    ///
    /// Resolution is purely positional. A number outside the article list
    /// leaves its marker unchanged, as do markers that already carry a URL.
    ///
    /// ```rust
    /// use digestr_citation::{Article, CitationResolver};
    /// # fn article(url: &str) -> Article {
    /// #     Article { id: 0, url: url.into(), title: String::new(), publisher: String::new(), published_date: None }
    /// # }
    /// let articles = vec![article("https://example.com/article1"), article("https://example.com/article2")];
    /// let out = CitationResolver::default().inject_citation_urls("According to [[1]] and [[2]], this is true.", &articles);
    /// assert_eq!(
    ///     out,
    ///     "According to [[1]](https://example.com/article1) and [[2]](https://example.com/article2), this is true."
    /// );
    /// ```
    pub fn inject_citation_urls(&self, markdown: &str, articles: &[Article]) -> String {
        let mut output = String::with_capacity(markdown.len());
        let mut last = 0;
        let mut skipped = 0usize;
        for captures in consts::DOUBLE_BARE_REGEX.captures_iter(markdown) {
            // Safety: group 0 is always present on a match, group 1 is not optional.
            let whole = captures.get(0).unwrap();
            let digits = captures.get(1).unwrap().as_str();
            if markdown[whole.end()..].starts_with('(') {
                continue;
            }
            let article = digits
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| articles.get(index));
            let Some(article) = article else {
                skipped += 1;
                continue;
            };
            output.push_str(&markdown[last..whole.end()]);
            output.push('(');
            output.push_str(&article.url);
            output.push(')');
            last = whole.end();
        }
        output.push_str(&markdown[last..]);
        if skipped > 0 {
            tracing::debug!(parent: &self.span, skipped, articles = articles.len(), "left out-of-range citation markers unchanged");
        }
        output
    }

    /// Builds persistable records for every reference whose URL is a known
    /// article. Unknown URLs are dropped without error.
    pub fn build_citation_records(
        &self,
        digest_id: &str,
        references: &[CitationReference],
        articles: &ArticlesByUrl<'_>,
    ) -> Vec<CitationRecord> {
        self.resolve(digest_id, references, articles).records
    }

    /// Like [`build_citation_records`](Self::build_citation_records), but
    /// also hands back the references that were dropped.
    #[instrument(level = "debug", parent = &self.span, skip(self, references, articles), fields(references = references.len()))]
    pub fn resolve(
        &self,
        digest_id: &str,
        references: &[CitationReference],
        articles: &ArticlesByUrl<'_>,
    ) -> Resolution {
        let now = UtcDateTime::now();
        let mut resolution = Resolution::default();
        for (occurrence, reference) in references.iter().enumerate() {
            let Some(article) = articles.get(reference.url.as_str()) else {
                tracing::debug!(number = reference.number, url = %reference.url, "dropping citation with unknown URL");
                resolution.dropped.push(reference.clone());
                continue;
            };
            resolution.records.push(CitationRecord {
                id: citation_id(digest_id, occurrence, reference.number, &reference.url),
                digest_id: digest_id.to_string(),
                article_id: article.id,
                citation_number: reference.number,
                url: article.url.clone(),
                title: article.title.clone(),
                publisher: article.publisher.clone(),
                published_date: article.published_date,
                accessed_date: now,
                context: reference.context.clone(),
                created_at: now,
            });
        }
        resolution
    }

    /// Parses `markdown` and resolves it against `articles` in one go.
    pub fn resolve_markdown(&self, digest_id: &str, markdown: &str, articles: &[Article]) -> Resolution {
        let references = self.parser.extract_citations(markdown);
        self.resolve(digest_id, &references, &articles_by_url(articles))
    }

    /// One warning per URL-bearing marker whose URL matches no article.
    ///
    /// Intended as a pre-publish check; never blocks storage.
    pub fn validate_citations(&self, markdown: &str, articles: &[Article]) -> Vec<CitationWarning> {
        let known: HashSet<&str> = articles.iter().map(|a| a.url.as_str()).collect();
        let warnings: Vec<CitationWarning> = self
            .parser
            .extract_citations(markdown)
            .into_iter()
            .filter(|r| !known.contains(r.url.as_str()))
            .map(|r| CitationWarning {
                number: r.number,
                url: Some(r.url),
                kind: WarningKind::UnknownUrl,
            })
            .collect();
        if !warnings.is_empty() {
            tracing::info!(parent: &self.span, unresolved = warnings.len(), "citations reference unknown articles");
        }
        warnings
    }

    /// Checks every number the text references, linked or bare, against the
    /// article list.
    pub fn audit_citations(&self, markdown: &str, articles: &[Article]) -> CitationAudit {
        let referenced = self.parser.parse_citation_numbers(markdown);
        let linked: HashSet<u32> = self.parser.extract_citations(markdown).iter().map(|r| r.number).collect();
        let in_range = |n: &u32| usize::try_from(*n).is_ok_and(|n| n <= articles.len());
        let out_of_range = referenced.iter().copied().filter(|n| !in_range(n)).collect();
        let unlinked = referenced
            .iter()
            .copied()
            .filter(|n| in_range(n) && !linked.contains(n))
            .collect();
        CitationAudit { referenced, out_of_range, unlinked }
    }
}
