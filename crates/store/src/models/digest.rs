use crate::error::{Error, ErrorKind, Result};
use crate::models::facet::{ArticleGroupProxy, ThemeNameProxy};
use crate::models::from_timestamp;
use digestr_citation::{Article, ArticleGroup, CitationRecord, Digest, Theme};
use exn::ResultExt;
use facet_json::{from_str as from_json, to_string as to_json};
use std::collections::HashMap;
use time::UtcDateTime;

/// A digest as read back from the database, together with everything that
/// was linked to it when it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDigest {
    /// The digest, with `articles` in citation order and `article_groups`
    /// rebuilt from the stored group membership.
    pub digest: Digest,
    /// Themes that resolved when the digest was stored, sorted by name.
    pub themes: Vec<Theme>,
    /// Every theme name the digest's groups mentioned, resolved or not.
    pub theme_names: Vec<String>,
    /// Citation records, ordered by citation number then order of appearance.
    pub citations: Vec<CitationRecord>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct DigestRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) summary: String,
    pub(crate) theme_names: String,
    pub(crate) article_groups: String,
    pub(crate) article_count: i64,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}
impl DigestRow {
    /// Build the row for `digest`, stamped with `now` for both timestamps.
    ///
    /// On conflict the upsert keeps the original `created_at`.
    pub(crate) fn new(digest: &Digest, now: UtcDateTime) -> Result<Self> {
        if digest.id.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidData("digest id"));
        }
        let theme_names = digest.theme_names().into_iter().map(ThemeNameProxy::from).collect::<Vec<_>>();
        let groups = digest.article_groups.iter().map(ArticleGroupProxy::from).collect::<Vec<_>>();
        Ok(Self {
            id: digest.id.clone(),
            title: digest.title.clone(),
            summary: digest.summary.clone(),
            theme_names: to_json(&theme_names).or_raise(|| ErrorKind::InvalidData("theme names"))?,
            article_groups: to_json(&groups).or_raise(|| ErrorKind::InvalidData("article groups"))?,
            article_count: i64::try_from(digest.articles.len()).or_raise(|| ErrorKind::InvalidData("article count"))?,
            created_at: now.unix_timestamp(),
            updated_at: now.unix_timestamp(),
        })
    }

    /// Reassemble the digest from its row and its linked rows.
    ///
    /// Group members that are no longer linked to the digest are left out of
    /// their group rather than failing the read.
    pub(crate) fn into_persisted(
        self,
        articles: Vec<Article>,
        themes: Vec<Theme>,
        citations: Vec<CitationRecord>,
    ) -> Result<PersistedDigest> {
        let theme_names = from_json::<Vec<ThemeNameProxy>>(&self.theme_names)
            .or_raise(|| ErrorKind::InvalidData("theme names"))?
            .into_iter()
            .map(|n| n.0)
            .collect::<Vec<_>>();
        let groups = from_json::<Vec<ArticleGroupProxy>>(&self.article_groups)
            .or_raise(|| ErrorKind::InvalidData("article groups"))?;
        if usize::try_from(self.article_count).ok() != Some(articles.len()) {
            tracing::debug!(
                digest_id = %self.id,
                stored = self.article_count,
                linked = articles.len(),
                "article count differs from linked articles"
            );
        }
        let by_id: HashMap<i64, &Article> = articles.iter().map(|a| (a.id, a)).collect();
        let article_groups = groups
            .into_iter()
            .map(|g| ArticleGroup {
                theme: g.theme,
                articles: g.articles.iter().filter_map(|id| by_id.get(id).map(|a| (*a).clone())).collect(),
            })
            .collect();
        Ok(PersistedDigest {
            digest: Digest {
                id: self.id,
                title: self.title,
                summary: self.summary,
                articles,
                article_groups,
            },
            themes,
            theme_names,
            citations,
            created_at: from_timestamp(self.created_at, "digest creation date")?,
            updated_at: from_timestamp(self.updated_at, "digest update date")?,
        })
    }
}
impl TryFrom<&Digest> for DigestRow {
    type Error = Error;
    fn try_from(digest: &Digest) -> Result<Self> {
        Self::new(digest, UtcDateTime::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64) -> Article {
        Article {
            id,
            url: format!("https://example.com/{id}"),
            title: format!("Article {id}"),
            publisher: "Example News".to_string(),
            published_date: None,
        }
    }

    fn digest() -> Digest {
        Digest {
            id: "weekly-42".to_string(),
            title: "Weekly".to_string(),
            summary: "Solar is up [[1]](https://example.com/1).".to_string(),
            articles: vec![article(1), article(2)],
            article_groups: vec![
                ArticleGroup { theme: "Energy".to_string(), articles: vec![article(1)] },
                ArticleGroup { theme: "Climate".to_string(), articles: vec![article(2), article(1)] },
            ],
        }
    }

    #[test]
    fn test_model_to_row() {
        let now = UtcDateTime::from_unix_timestamp(1_760_000_000).unwrap();
        let row = DigestRow::new(&digest(), now).unwrap();
        assert_eq!(row.theme_names, r#"["Energy","Climate"]"#);
        assert_eq!(row.article_groups, r#"[{"t":"Energy","a":[1]},{"t":"Climate","a":[2,1]}]"#);
        assert_eq!(row.article_count, 2);
        assert_eq!(row.created_at, 1_760_000_000);
    }

    #[test]
    fn test_blank_id_is_rejected() {
        let mut digest = digest();
        digest.id = "  ".to_string();
        let err = DigestRow::try_from(&digest).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidData("digest id")));
    }

    #[test]
    fn test_row_to_model() {
        let now = UtcDateTime::from_unix_timestamp(1_760_000_000).unwrap();
        let original = digest();
        let row = DigestRow::new(&original, now).unwrap();
        let persisted = row.into_persisted(original.articles.clone(), vec![], vec![]).unwrap();
        assert_eq!(persisted.digest, original);
        assert_eq!(persisted.theme_names, vec!["Energy".to_string(), "Climate".to_string()]);
        assert_eq!(persisted.updated_at, now);
    }

    #[test]
    fn test_unlinked_group_members_are_left_out() {
        let now = UtcDateTime::from_unix_timestamp(1_760_000_000).unwrap();
        let row = DigestRow::new(&digest(), now).unwrap();
        let persisted = row.into_persisted(vec![article(1)], vec![], vec![]).unwrap();
        assert_eq!(persisted.digest.article_groups[1].articles, vec![article(1)]);
    }
}
