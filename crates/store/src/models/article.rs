use crate::error::{Error, ErrorKind};
use crate::models::from_timestamp;
use digestr_citation::Article;
use time::UtcDateTime;

/// An article that hasn't been assigned an ID by the store yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub publisher: String,
    pub published_date: Option<UtcDateTime>,
}
impl NewArticle {
    pub fn new(url: impl Into<String>, title: impl Into<String>, publisher: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            publisher: publisher.into(),
            published_date: None,
        }
    }

    pub fn published(mut self, date: UtcDateTime) -> Self {
        self.published_date = Some(date);
        self
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ArticleRow {
    pub(crate) id: i64,
    pub(crate) url: String,
    pub(crate) title: String,
    pub(crate) publisher: String,
    #[sqlx(default)]
    pub(crate) published_at: Option<i64>,
    #[allow(dead_code)]
    pub(crate) created_at: i64,
}
impl TryFrom<ArticleRow> for Article {
    type Error = Error;
    fn try_from(row: ArticleRow) -> Result<Self, Self::Error> {
        if row.url.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidData("article url"));
        }
        Ok(Self {
            id: row.id,
            url: row.url,
            title: row.title,
            publisher: row.publisher,
            published_date: row
                .published_at
                .map(|ts| from_timestamp(ts, "article published date"))
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let row = ArticleRow {
            id: 7,
            url: "https://example.com/grid".to_string(),
            title: "Grid operators report record solar output".to_string(),
            publisher: "Example News".to_string(),
            published_at: Some(1_760_000_000),
            created_at: 1_760_000_100,
        };
        let model = Article::try_from(row).unwrap();
        assert_eq!(model.id, 7);
        assert_eq!(model.published_date.unwrap().unix_timestamp(), 1_760_000_000);
    }

    #[test]
    fn test_row_with_empty_url_is_rejected() {
        let row = ArticleRow {
            id: 7,
            url: " ".to_string(),
            title: String::new(),
            publisher: String::new(),
            published_at: None,
            created_at: 0,
        };
        assert!(Article::try_from(row).is_err());
    }
}
