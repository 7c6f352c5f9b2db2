//! Articles are written by ingestion and only ever referenced by digests.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::executor::Executor;
use crate::models::{ArticleRow, NewArticle};
use digestr_citation::Article;
use exn::ResultExt;
use facet_json::to_string as to_json;
use sqlx::SqlitePool;
use time::UtcDateTime;

/// Repository for [`Article`]s, keyed by ID and unique by URL.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    pool: SqlitePool,
}
impl From<&Database> for ArticleStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl ArticleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert an article, or refresh the stored one with the same URL.
    ///
    /// The article keeps its ID across refreshes.
    pub async fn upsert(&self, article: &NewArticle) -> Result<Article> {
        Self::upsert_in(&self.pool, article).await
    }

    pub async fn upsert_in<'e>(executor: impl Executor<'e>, article: &NewArticle) -> Result<Article> {
        if article.url.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidData("article url"));
        }
        let row: ArticleRow = sqlx::query_as(include_str!("../../queries/upsert_article.sql"))
            .bind(&article.url)
            .bind(&article.title)
            .bind(&article.publisher)
            .bind(article.published_date.map(|d| d.unix_timestamp()))
            .bind(UtcDateTime::now().unix_timestamp())
            .fetch_one(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.try_into()
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        Self::get_by_id_in(&self.pool, id).await
    }

    pub async fn get_by_id_in<'e>(executor: impl Executor<'e>, id: i64) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(include_str!("../../queries/get_article_by_id.sql"))
            .bind(id)
            .fetch_optional(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(|r| r.try_into()).transpose()
    }

    pub async fn get_by_url(&self, url: impl AsRef<str>) -> Result<Option<Article>> {
        Self::get_by_url_in(&self.pool, url).await
    }

    pub async fn get_by_url_in<'e>(executor: impl Executor<'e>, url: impl AsRef<str>) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(include_str!("../../queries/get_article_by_url.sql"))
            .bind(url.as_ref())
            .fetch_optional(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(|r| r.try_into()).transpose()
    }

    /// Every known article among `urls`, ordered by ID. Unknown URLs are
    /// simply absent from the result.
    pub async fn get_by_urls(&self, urls: &[String]) -> Result<Vec<Article>> {
        Self::get_by_urls_in(&self.pool, urls).await
    }

    pub async fn get_by_urls_in<'e>(executor: impl Executor<'e>, urls: &[String]) -> Result<Vec<Article>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        let urls = to_json(&urls.to_vec()).or_raise(|| ErrorKind::InvalidData("article urls"))?;
        let rows: Vec<ArticleRow> = sqlx::query_as(include_str!("../../queries/get_articles_by_urls.sql"))
            .bind(urls)
            .fetch_all(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Every known article among `ids`, ordered by ID. Unknown IDs are simply
    /// absent from the result.
    pub async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>> {
        Self::get_by_ids_in(&self.pool, ids).await
    }

    pub async fn get_by_ids_in<'e>(executor: impl Executor<'e>, ids: &[i64]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = to_json(&ids.to_vec()).or_raise(|| ErrorKind::InvalidData("article ids"))?;
        let rows: Vec<ArticleRow> = sqlx::query_as(include_str!("../../queries/get_articles_by_ids.sql"))
            .bind(ids)
            .fetch_all(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }
}
