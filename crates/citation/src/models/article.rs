use time::UtcDateTime;

/// A source article, as known to the article store.
///
/// The URL is the natural key: citations are matched to articles by URL, and
/// no two stored articles share one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub publisher: String,
    pub published_date: Option<UtcDateTime>,
}
