//! Atomic persistence of a digest and everything it references.
//!
//! A digest is written as one unit: the digest row, its article links, its
//! theme links and its citation records either all become visible at commit
//! or none of them do. Readers keep seeing the previously committed version
//! of the digest until then.

use crate::Database;
use crate::error::{ErrorKind, Result, WriteStep};
use crate::models::{CitationRow, DigestRow};
use crate::repo::theme::ThemeStore;
use digestr_citation::{CitationResolver, Digest};
use exn::ResultExt;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{Span, instrument};

/// What a successful write linked, and what it had to leave out.
///
/// Skipped themes and dropped citations are not errors; this is where they
/// become visible to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreReport {
    /// Distinct articles linked to the digest.
    pub articles_linked: usize,
    /// Themes that resolved to an ID and were linked.
    pub themes_linked: usize,
    /// Theme names that resolved to nothing, in first-seen order.
    pub skipped_themes: Vec<String>,
    /// Citation records written.
    pub citations_stored: usize,
    /// URL-bearing markers whose URL matched none of the digest's articles.
    pub citations_dropped: usize,
}

struct ThemeResolution {
    ids: Vec<i64>,
    skipped: Vec<String>,
}

/// Writes digests together with their article links, theme links and
/// citations.
#[derive(Debug, Clone)]
pub struct DigestWriter {
    pool: SqlitePool,
    resolver: CitationResolver,
    span: Span,
    dry_run: bool,
}
impl From<&Database> for DigestWriter {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone(), CitationResolver::default(), Span::none())
    }
}
impl DigestWriter {
    /// Create a writer; its events are recorded under `span`.
    pub fn new(pool: SqlitePool, resolver: CitationResolver, span: Span) -> Self {
        Self { pool, resolver, span, dry_run: false }
    }

    /// In dry-run mode the writer resolves citations and themes and reports
    /// what it would have written, without ever opening a write transaction.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn resolver(&self) -> &CitationResolver {
        &self.resolver
    }

    /// Persist `digest` with its article links, theme links and citations.
    ///
    /// - `article_ids` are linked in order, with 1-based positions. The same
    ///   ID appearing twice is linked once, at its first position. IDs that
    ///   don't exist fail the write.
    /// - `theme_ids` maps theme names to known IDs. Names and keys are both
    ///   compared with surrounding whitespace trimmed. Names implied by the
    ///   digest's article groups that are missing from it are looked up by
    ///   name; names that don't resolve are skipped.
    /// - Citations are parsed from the summary and resolved against
    ///   `digest.articles` by URL; unresolved ones are dropped.
    ///
    /// Storing the same digest again replaces its previous links and
    /// citations. Any failure rolls the whole write back, and the error
    /// names the step that failed.
    #[instrument(parent = &self.span, skip_all, fields(digest_id = %digest.id, articles = article_ids.len(), dry_run = self.dry_run))]
    pub async fn store_with_relationships(
        &self,
        digest: &Digest,
        article_ids: &[i64],
        theme_ids: &HashMap<String, i64>,
    ) -> Result<StoreReport> {
        let row = DigestRow::try_from(digest)?;
        let resolution = self.resolver.resolve_markdown(&digest.id, &digest.summary, &digest.articles);
        let citations = resolution.records.iter().map(CitationRow::from).collect::<Vec<_>>();
        let citations_dropped = resolution.dropped.len();

        if self.dry_run {
            let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
            let themes = self.resolve_themes(&mut *conn, digest, theme_ids).await?;
            let report = StoreReport {
                articles_linked: Self::positions(article_ids).len(),
                themes_linked: themes.ids.len(),
                skipped_themes: themes.skipped,
                citations_stored: citations.len(),
                citations_dropped,
            };
            tracing::info!(parent: &self.span, %report, "dry run, digest not stored");
            return Ok(report);
        }

        // IMMEDIATE takes the write lock up front, so contention with another
        // writer fails here (and is retryable) rather than part way through.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .or_raise(|| ErrorKind::Transaction(WriteStep::Begin))?;
        let written = self.write(&mut *tx, digest, row, article_ids, theme_ids, &citations).await;
        let mut report = match written {
            Ok(report) => report,
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(parent: &self.span, error = %rollback, "rollback failed");
                }
                return Err(err);
            }
        };
        tx.commit().await.or_raise(|| ErrorKind::Transaction(WriteStep::Commit))?;
        report.citations_dropped = citations_dropped;
        tracing::info!(
            parent: &self.span,
            articles = report.articles_linked,
            themes = report.themes_linked,
            citations = report.citations_stored,
            "digest stored"
        );
        Ok(report)
    }

    async fn write(
        &self,
        conn: &mut SqliteConnection,
        digest: &Digest,
        row: DigestRow,
        article_ids: &[i64],
        theme_ids: &HashMap<String, i64>,
        citations: &[CitationRow],
    ) -> Result<StoreReport> {
        // Digest
        sqlx::query(include_str!("../../queries/upsert_digest.sql"))
            .bind(row.id)
            .bind(row.title)
            .bind(row.summary)
            .bind(row.theme_names)
            .bind(row.article_groups)
            .bind(row.article_count)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Transaction(WriteStep::Digest))?;

        // Article links
        sqlx::query(include_str!("../../queries/delete_digest_articles.sql"))
            .bind(&digest.id)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Transaction(WriteStep::ArticleLinks))?;
        let mut articles_linked = 0;
        for (position, article_id) in article_ids.iter().enumerate() {
            let position = i64::try_from(position + 1).or_raise(|| ErrorKind::InvalidData("article position"))?;
            let result = sqlx::query(include_str!("../../queries/insert_digest_article.sql"))
                .bind(&digest.id)
                .bind(article_id)
                .bind(position)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Transaction(WriteStep::ArticleLinks))?;
            if result.rows_affected() > 0 {
                articles_linked += 1;
            }
        }

        // Theme links
        let themes = self
            .resolve_themes(&mut *conn, digest, theme_ids)
            .await
            .or_raise(|| ErrorKind::Transaction(WriteStep::ThemeLinks))?;
        sqlx::query(include_str!("../../queries/delete_digest_themes.sql"))
            .bind(&digest.id)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Transaction(WriteStep::ThemeLinks))?;
        let mut themes_linked = 0;
        for theme_id in &themes.ids {
            let result = sqlx::query(include_str!("../../queries/insert_digest_theme.sql"))
                .bind(&digest.id)
                .bind(theme_id)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Transaction(WriteStep::ThemeLinks))?;
            if result.rows_affected() > 0 {
                themes_linked += 1;
            }
        }

        // Citations
        sqlx::query(include_str!("../../queries/delete_citations.sql"))
            .bind(&digest.id)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Transaction(WriteStep::Citations))?;
        for citation in citations {
            Self::upsert_citation(&mut *conn, citation)
                .await
                .or_raise(|| ErrorKind::Transaction(WriteStep::Citations))?;
        }

        Ok(StoreReport {
            articles_linked,
            themes_linked,
            skipped_themes: themes.skipped,
            citations_stored: citations.len(),
            citations_dropped: 0,
        })
    }

    async fn upsert_citation(conn: &mut SqliteConnection, citation: &CitationRow) -> sqlx::Result<()> {
        sqlx::query(include_str!("../../queries/upsert_citation.sql"))
            .bind(&citation.id)
            .bind(&citation.digest_id)
            .bind(citation.article_id)
            .bind(citation.citation_number)
            .bind(&citation.url)
            .bind(&citation.title)
            .bind(&citation.publisher)
            .bind(citation.published_at)
            .bind(citation.accessed_at)
            .bind(&citation.context)
            .bind(citation.created_at)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Resolve every theme name the digest's groups mention, caller-supplied
    /// IDs first.
    async fn resolve_themes(
        &self,
        conn: &mut SqliteConnection,
        digest: &Digest,
        theme_ids: &HashMap<String, i64>,
    ) -> Result<ThemeResolution> {
        let hints: HashMap<&str, i64> = theme_ids.iter().map(|(name, id)| (name.trim(), *id)).collect();
        let mut resolution = ThemeResolution { ids: Vec::new(), skipped: Vec::new() };
        for name in digest.theme_names() {
            let id = match hints.get(name) {
                Some(id) => Some(*id),
                None => ThemeStore::get_by_name_in(&mut *conn, name).await?.map(|t| t.id),
            };
            match id {
                Some(id) if !resolution.ids.contains(&id) => resolution.ids.push(id),
                Some(_) => {}
                None => {
                    tracing::debug!(parent: &self.span, theme = name, "skipping unknown theme");
                    resolution.skipped.push(name.to_string());
                }
            }
        }
        Ok(resolution)
    }

    /// Distinct article IDs in first-seen order.
    fn positions(article_ids: &[i64]) -> Vec<i64> {
        let mut seen = Vec::with_capacity(article_ids.len());
        for id in article_ids {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}

impl std::fmt::Display for StoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} articles, {} themes ({} skipped), {} citations ({} dropped)",
            self.articles_linked,
            self.themes_linked,
            self.skipped_themes.len(),
            self.citations_stored,
            self.citations_dropped,
        )
    }
}
