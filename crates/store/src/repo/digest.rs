//! Reading stored digests back.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::executor::Executor;
use crate::models::{ArticleRow, CitationRow, DigestRow, PersistedDigest, ThemeRow};
use digestr_citation::{Article, CitationRecord, Theme};
use exn::{OptionExt, ResultExt};
use sqlx::{SqliteConnection, SqlitePool};

/// Read access to stored digests and everything linked to them.
///
/// Multi-table reads run in a single transaction, so a digest is never seen
/// half-way through being rewritten.
#[derive(Debug, Clone)]
pub struct DigestRepository {
    pool: SqlitePool,
}
impl From<&Database> for DigestRepository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl DigestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a digest with its articles (in citation order), themes and
    /// citations.
    pub async fn get(&self, digest_id: impl AsRef<str>) -> Result<Option<PersistedDigest>> {
        let digest_id = digest_id.as_ref();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let row: Option<DigestRow> = sqlx::query_as(include_str!("../../queries/get_digest.sql"))
            .bind(digest_id)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let articles = Self::list_articles_in(&mut *tx, digest_id).await?;
        let themes = Self::list_themes_in(&mut *tx, digest_id).await?;
        let citations = Self::list_citations_in(&mut *tx, digest_id).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        row.into_persisted(articles, themes, citations).map(Some)
    }

    /// Like [`get`](Self::get), but a missing digest is an error.
    pub async fn load(&self, digest_id: impl AsRef<str>) -> Result<PersistedDigest> {
        let digest_id = digest_id.as_ref();
        self.get(digest_id)
            .await?
            .ok_or_raise(|| ErrorKind::DigestNotFound(digest_id.to_string()))
    }

    /// Citation records of a digest, ordered by citation number and then by
    /// order of appearance in the summary. Empty if the digest is unknown.
    pub async fn list_citations(&self, digest_id: impl AsRef<str>) -> Result<Vec<CitationRecord>> {
        Self::list_citations_in(&self.pool, digest_id.as_ref()).await
    }

    pub async fn list_citations_in<'e>(executor: impl Executor<'e>, digest_id: &str) -> Result<Vec<CitationRecord>> {
        let rows: Vec<CitationRow> = sqlx::query_as(include_str!("../../queries/list_citations.sql"))
            .bind(digest_id)
            .fetch_all(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    pub async fn exists(&self, digest_id: impl AsRef<str>) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(include_str!("../../queries/digest_exists.sql"))
            .bind(digest_id.as_ref())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Delete a digest together with its article links, theme links and
    /// citations. Articles and themes themselves are kept.
    ///
    /// Returns `false` if there was no such digest.
    pub async fn delete(&self, digest_id: impl AsRef<str>) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/delete_digest.sql"))
            .bind(digest_id.as_ref())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_articles_in(conn: &mut SqliteConnection, digest_id: &str) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(include_str!("../../queries/list_digest_articles.sql"))
            .bind(digest_id)
            .fetch_all(conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_themes_in(conn: &mut SqliteConnection, digest_id: &str) -> Result<Vec<Theme>> {
        let rows: Vec<ThemeRow> = sqlx::query_as(include_str!("../../queries/list_digest_themes.sql"))
            .bind(digest_id)
            .fetch_all(conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Theme::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewArticle;
    use crate::repo::{ArticleStore, DigestWriter};
    use digestr_citation::{ArticleGroup, Digest};
    use std::collections::HashMap;

    async fn stored(db: &Database) -> Article {
        let article = ArticleStore::from(db)
            .upsert(&NewArticle::new("https://example.com/heat", "Heat pumps outsell boilers", "Example News"))
            .await
            .unwrap();
        let digest = Digest {
            id: "daily-7".to_string(),
            title: "Daily".to_string(),
            summary: "Heat pumps [[1]](https://example.com/heat) and again [[1]](https://example.com/heat).".to_string(),
            articles: vec![article.clone()],
            article_groups: vec![ArticleGroup { theme: "Energy".to_string(), articles: vec![article.clone()] }],
        };
        crate::repo::ThemeStore::from(db).upsert("Energy").await.unwrap();
        DigestWriter::from(db)
            .store_with_relationships(&digest, &[article.id], &HashMap::new())
            .await
            .unwrap();
        article
    }

    #[tokio::test]
    async fn test_missing_digest() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = DigestRepository::from(&db);
        assert_eq!(repo.get("nope").await.unwrap(), None);
        assert!(!repo.exists("nope").await.unwrap());
        assert!(repo.list_citations("nope").await.unwrap().is_empty());
        let err = repo.load("nope").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::DigestNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_repeated_citations_are_kept_in_order() {
        let db = Database::connect_in_memory().await.unwrap();
        stored(&db).await;
        let citations = DigestRepository::from(&db).list_citations("daily-7").await.unwrap();
        assert_eq!(citations.len(), 2);
        assert_ne!(citations[0].id, citations[1].id);
        assert!(citations[0].context.starts_with("Heat pumps"));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_links() {
        let db = Database::connect_in_memory().await.unwrap();
        let article = stored(&db).await;
        let repo = DigestRepository::from(&db);
        assert!(repo.exists("daily-7").await.unwrap());
        assert!(repo.delete("daily-7").await.unwrap());
        assert!(!repo.delete("daily-7").await.unwrap());
        assert!(!repo.exists("daily-7").await.unwrap());
        for table in ["digest_articles", "digest_themes", "citations"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(db.pool())
                .await
                .unwrap();
            assert_eq!(count, 0, "{table} should be empty");
        }
        // Referenced records outlive the digest.
        assert_eq!(ArticleStore::from(&db).get_by_id(article.id).await.unwrap(), Some(article));
    }
}
