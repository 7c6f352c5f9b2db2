use time::UtcDateTime;

/// A single citation marker found in digest text.
///
/// Purely the result of parsing: nothing about it has been checked against
/// the articles that actually exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationReference {
    /// 1-based position of the cited article in the digest's article list.
    pub number: u32,
    /// URL attached to the marker.
    pub url: String,
    /// Text surrounding the marker, for provenance review.
    pub context: String,
}

/// A citation that has been resolved to a known article and is ready to be
/// persisted alongside its digest.
///
/// The `id` is derived from the digest and the marker it came from, so
/// resolving the same digest summary again yields the same identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationRecord {
    pub id: String,
    pub digest_id: String,
    pub article_id: i64,
    pub citation_number: u32,
    pub url: String,
    pub title: String,
    pub publisher: String,
    pub published_date: Option<UtcDateTime>,
    pub accessed_date: UtcDateTime,
    pub context: String,
    pub created_at: UtcDateTime,
}

/// Content-derived identifier for a citation record.
///
/// `occurrence` is the index of the marker among all URL-bearing markers of
/// the summary, which keeps repeated citations of the same article distinct.
pub fn citation_id(digest_id: &str, occurrence: usize, number: u32, url: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(digest_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(&(occurrence as u64).to_le_bytes());
    hasher.update(&number.to_le_bytes());
    hasher.update(url.as_bytes());
    hasher.finalize().to_string()
}
