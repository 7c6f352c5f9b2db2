//! Citation marker parsing.
//!
//! Two marker dialects are recognised, each optionally followed by a
//! parenthesised URL:
//!
//! | Marker        | Bare    | With URL           |
//! |---------------|---------|--------------------|
//! | double-bracket| `[[3]]` | `[[3]](https://…)` |
//! | single-bracket| `[3]`   | `[3](https://…)`   |
//!
//! The number always refers to the position of an article in the digest's
//! article list (1-based). Parsing knows nothing about which articles exist.

use std::collections::HashSet;
use tracing::{Span, instrument};

use crate::consts::{self, DEFAULT_MAX_CONTEXT, DEFAULT_MIN_CONTEXT};
use crate::error::{ErrorKind, Result};
use crate::models::CitationReference;

/// Bounds (in characters) of the text captured around each citation marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    min: usize,
    max: usize,
}
impl ContextWindow {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min == 0 || max == 0 || min > max {
            exn::bail!(ErrorKind::InvalidContextWindow { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}
impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_CONTEXT,
            max: DEFAULT_MAX_CONTEXT,
        }
    }
}
impl TryFrom<(usize, usize)> for ContextWindow {
    type Error = crate::error::Error;
    fn try_from((min, max): (usize, usize)) -> std::result::Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

/// Finds citation markers in markdown.
///
/// Stateless apart from its settings, so a single parser can be shared
/// between any number of threads. Events are recorded under the span given
/// at construction instead of whatever span happens to be current.
#[derive(Debug, Clone)]
pub struct CitationParser {
    window: ContextWindow,
    span: Span,
}
impl Default for CitationParser {
    fn default() -> Self {
        Self::new(ContextWindow::default(), Span::none())
    }
}
impl CitationParser {
    pub fn new(window: ContextWindow, span: Span) -> Self {
        Self { window, span }
    }

    /// Convenience constructor for raw window bounds (e.g. from configuration).
    pub fn with_bounds(min: usize, max: usize, span: Span) -> Result<Self> {
        Ok(Self::new(ContextWindow::new(min, max)?, span))
    }

    pub fn window(&self) -> ContextWindow {
        self.window
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Extracts every URL-bearing citation marker, left to right.
    ///
    /// Both `[[N]](URL)` and `[N](URL)` are matched. Occurrences are not
    /// deduplicated: citing the same article twice yields two references.
    /// Bare markers without a URL are ignored (see
    /// [`parse_citation_numbers`](Self::parse_citation_numbers) for those).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use digestr_citation::CitationParser;
    /// let parser = CitationParser::default();
    /// let refs = parser.extract_citations("Recent research [[1]](https://example.com/article1) shows improvements.");
    /// assert_eq!(refs.len(), 1);
    /// assert_eq!(refs[0].number, 1);
    /// assert_eq!(refs[0].url, "https://example.com/article1");
    /// ```
    #[instrument(level = "trace", parent = &self.span, skip_all, fields(text_size = text.len()))]
    pub fn extract_citations(&self, text: &str) -> Vec<CitationReference> {
        let mut references = Vec::new();
        for captures in consts::WITH_URL_REGEX.captures_iter(text) {
            // Groups 1 & 2 belong to the double-bracket dialect, 3 & 4 to the single.
            let (Some(number), Some(url)) = (
                captures.get(1).or_else(|| captures.get(3)),
                captures.get(2).or_else(|| captures.get(4)),
            ) else {
                continue;
            };
            let Some(number) = parse_number(number.as_str()) else {
                continue;
            };
            // Safety: group 0 is always present on a match.
            let whole = captures.get(0).unwrap();
            references.push(CitationReference {
                number,
                url: url.as_str().trim().to_string(),
                context: context(text, whole.start(), whole.end(), self.window),
            });
        }
        tracing::trace!(parent: &self.span, count = references.len(), "extracted citations");
        references
    }

    /// Every citation number referenced in the text, with or without a URL,
    /// deduplicated and in order of first appearance.
    ///
    /// ```rust
    /// use digestr_citation::CitationParser;
    /// let numbers = CitationParser::default().parse_citation_numbers("Evidence from [[1]], [[1]], and [[2]]");
    /// assert_eq!(numbers, vec![1, 2]);
    /// ```
    pub fn parse_citation_numbers(&self, text: &str) -> Vec<u32> {
        let mut seen = HashSet::new();
        let mut numbers = Vec::new();
        for captures in consts::ANY_MARKER_REGEX.captures_iter(text) {
            if let Some(number) = captures.get(1).or_else(|| captures.get(2))
                && let Some(number) = parse_number(number.as_str())
                && seen.insert(number)
            {
                numbers.push(number);
            }
        }
        numbers
    }

    /// Number of URL-bearing markers; always `extract_citations(text).len()`.
    pub fn count_citations(&self, text: &str) -> usize {
        consts::WITH_URL_REGEX
            .captures_iter(text)
            .filter(|c| c.get(1).or_else(|| c.get(3)).and_then(|n| parse_number(n.as_str())).is_some())
            .count()
    }
}

/// Canonical rendering of a citation number.
pub fn format_citation_number(number: u32) -> String {
    format!("[{}]", number)
}

/// Citation numbers are 1-based; zero and anything that doesn't fit in a
/// `u32` is not a citation.
fn parse_number(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Byte offset where the sentence containing `start` begins.
fn sentence_start(text: &str, start: usize) -> usize {
    let mut next = text[start..].chars().next();
    for (i, c) in text[..start].char_indices().rev() {
        if c == '\n' || (is_terminator(c) && next.is_some_and(char::is_whitespace)) {
            return i + c.len_utf8();
        }
        next = Some(c);
    }
    0
}

/// Byte offset where the sentence containing `end` finishes (terminator
/// included, newline excluded).
fn sentence_end(text: &str, end: usize) -> usize {
    let mut chars = text[end..].char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\n' {
            return end + i;
        }
        if is_terminator(c) && chars.peek().is_none_or(|(_, n)| n.is_whitespace()) {
            return end + i + c.len_utf8();
        }
    }
    text.len()
}

/// Moves `pos` left by up to `n` characters.
fn step_back(text: &str, pos: usize, n: usize) -> usize {
    text[..pos].char_indices().rev().take(n).last().map_or(pos, |(i, _)| i)
}

/// Moves `pos` right by up to `n` characters.
fn step_forward(text: &str, pos: usize, n: usize) -> usize {
    text[pos..].char_indices().take(n).last().map_or(pos, |(i, c)| pos + i + c.len_utf8())
}

fn collapsed_len(text: &str) -> usize {
    let (words, chars) = text.split_whitespace().fold((0usize, 0usize), |(w, c), word| (w + 1, c + word.chars().count()));
    chars + words.saturating_sub(1)
}

/// The sentence around a marker, widened or clamped to fit the window.
fn context(text: &str, start: usize, end: usize, window: ContextWindow) -> String {
    let mut lo = sentence_start(text, start);
    let mut hi = sentence_end(text, end);
    // Whitespace is collapsed in the result, so it doesn't count towards the minimum.
    let mut len = collapsed_len(&text[lo..hi]);
    while len < window.min {
        let mut grew = false;
        if let Some(c) = text[..lo].chars().next_back() {
            lo -= c.len_utf8();
            len += usize::from(!c.is_whitespace());
            grew = true;
        }
        if len < window.min
            && let Some(c) = text[hi..].chars().next()
        {
            hi += c.len_utf8();
            len += usize::from(!c.is_whitespace());
            grew = true;
        }
        if !grew {
            break;
        }
    }
    if len > window.max {
        let marker = text[start..end].chars().count();
        let budget = window.max.saturating_sub(marker);
        let before = text[lo..start].chars().count();
        let after = text[end..hi].chars().count();
        let take_after = (budget - (budget / 2).min(before)).min(after);
        let take_before = (budget - take_after).min(before);
        lo = step_back(text, start, take_before);
        hi = step_forward(text, end, take_after);
    }
    text[lo..hi].split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parser() -> CitationParser {
        CitationParser::default()
    }

    #[test]
    fn test_single_citation() {
        let refs = parser().extract_citations("Recent research [[1]](https://example.com/article1) shows improvements.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].number, 1);
        assert_eq!(refs[0].url, "https://example.com/article1");
        assert!(refs[0].context.contains("[[1]](https://example.com/article1)"));
        assert!(refs[0].context.chars().count() >= DEFAULT_MIN_CONTEXT);
    }

    #[test]
    fn test_multiple_citations_in_order() {
        let refs = parser().extract_citations("Evidence from [[1]](url1) and [[2]](url2) suggests [[3]](url3) is correct.");
        let numbers: Vec<u32> = refs.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["url1", "url2", "url3"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let refs = parser().extract_citations("First [[1]](url1), again [[1]](url1).");
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_mixed_dialects() {
        let refs = parser().extract_citations("Text [[1]](url1) and [2](url2) and [[3]](url3)");
        let numbers: Vec<u32> = refs.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_bare_markers_are_not_extracted() {
        assert!(parser().extract_citations("According to [[1]] and [2], this is true.").is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("No citations here at all.")]
    #[case("Unmatched [[1] (url) and [2(url) and [[3]](")]
    #[case("[[]](url) [x](url) [[0]](url)")]
    #[case("[[99999999999999999999]](url)")]
    #[case("[[[[[[")]
    fn test_no_matches(#[case] text: &str) {
        assert!(parser().extract_citations(text).is_empty());
        assert_eq!(parser().count_citations(text), 0);
    }

    #[rstest]
    #[case("Text [[1]](url1) and [2](url2) and [[3]](url3)", 3)]
    #[case("Only [[1]] bare and one [2](url2)", 1)]
    #[case("Same [[1]](url1) twice [[1]](url1)", 2)]
    #[case("", 0)]
    fn test_count_matches_extract(#[case] text: &str, #[case] expected: usize) {
        assert_eq!(parser().count_citations(text), expected);
        assert_eq!(parser().extract_citations(text).len(), expected);
    }

    #[rstest]
    #[case("Evidence from [[1]], [[1]], and [[2]]", vec![1, 2])]
    #[case("See [3] then [[1]](url) then [2](url) and [3] again", vec![3, 1, 2])]
    #[case("Nothing", vec![])]
    #[case("", vec![])]
    fn test_parse_citation_numbers(#[case] text: &str, #[case] expected: Vec<u32>) {
        assert_eq!(parser().parse_citation_numbers(text), expected);
    }

    #[test]
    fn test_parse_numbers_covers_extracted() {
        let text = "A [[4]](u4) b [[2]] c [1](u1) d [[4]](u4)";
        let numbers = parser().parse_citation_numbers(text);
        for reference in parser().extract_citations(text) {
            assert!(numbers.contains(&reference.number));
        }
        assert_eq!(numbers, vec![4, 2, 1]);
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(4_000_000_000)]
    fn test_format_round_trip(#[case] number: u32) {
        let rendered = format_citation_number(number);
        assert_eq!(rendered, format!("[{}]", number));
        assert_eq!(parser().parse_citation_numbers(&rendered), vec![number]);
    }

    #[test]
    fn test_context_is_the_containing_sentence() {
        let text = "The first sentence talks about something else entirely. \
                    Solar output rose sharply this quarter according to grid operators [[1]](https://example.com/a). \
                    A third sentence follows.";
        let refs = parser().extract_citations(text);
        assert_eq!(
            refs[0].context,
            "Solar output rose sharply this quarter according to grid operators [[1]](https://example.com/a)."
        );
    }

    #[test]
    fn test_short_sentence_context_is_widened() {
        let text = "Background material that precedes the claim. Short [[1]](u). Trailing material that follows the claim.";
        let refs = parser().extract_citations(text);
        let context = &refs[0].context;
        assert!(context.contains("Short [[1]](u)."));
        assert!(context.chars().count() >= DEFAULT_MIN_CONTEXT);
    }

    #[test]
    fn test_long_sentence_context_is_clamped() {
        let filler = "word ".repeat(200);
        let text = format!("{}[[1]](https://example.com/a) {}", filler, filler);
        let parser = CitationParser::new(ContextWindow::new(50, 120).unwrap(), Span::none());
        let refs = parser.extract_citations(&text);
        assert!(refs[0].context.contains("[[1]](https://example.com/a)"));
        assert!(refs[0].context.chars().count() <= 120);
    }

    #[test]
    fn test_context_respects_char_boundaries() {
        let text = "Ünïcödé prose · with «quotes» and emoji 🎉 before [[1]](u) and 日本語のテキスト after it.";
        let parser = CitationParser::new(ContextWindow::new(10, 20).unwrap(), Span::none());
        let refs = parser.extract_citations(text);
        assert_eq!(refs.len(), 1);
        assert!(refs[0].context.contains("[[1]](u)"));
    }

    #[rstest]
    #[case("", 0)]
    #[case("one", 3)]
    #[case("  two   words \n", 9)]
    #[case("a\tb\nc", 5)]
    fn test_collapsed_len(#[case] text: &str, #[case] expected: usize) {
        assert_eq!(collapsed_len(text), expected);
        assert_eq!(collapsed_len(text), text.split_whitespace().collect::<Vec<_>>().join(" ").chars().count());
    }

    #[test]
    fn test_whole_text_shorter_than_window() {
        let refs = parser().extract_citations("[1](u)");
        assert_eq!(refs[0].context, "[1](u)");
    }

    #[rstest]
    #[case(0, 10)]
    #[case(10, 0)]
    #[case(20, 10)]
    fn test_invalid_window(#[case] min: usize, #[case] max: usize) {
        let err = ContextWindow::new(min, max).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidContextWindow { min, max });
    }
}
