//! Themes are shared between digests and looked up by name.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::executor::Executor;
use crate::models::ThemeRow;
use digestr_citation::Theme;
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;

/// Repository for [`Theme`]s, unique by name.
///
/// A name that isn't found is a normal outcome (`Ok(None)`), never an error.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    pool: SqlitePool,
}
impl From<&Database> for ThemeStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl ThemeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the theme with this name, creating it if needed.
    pub async fn upsert(&self, name: impl AsRef<str>) -> Result<Theme> {
        Self::upsert_in(&self.pool, name).await
    }

    pub async fn upsert_in<'e>(executor: impl Executor<'e>, name: impl AsRef<str>) -> Result<Theme> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            exn::bail!(ErrorKind::InvalidData("theme name"));
        }
        let row: ThemeRow = sqlx::query_as(include_str!("../../queries/upsert_theme.sql"))
            .bind(name)
            .bind(UtcDateTime::now().unix_timestamp())
            .fetch_one(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.into())
    }

    pub async fn get_by_name(&self, name: impl AsRef<str>) -> Result<Option<Theme>> {
        Self::get_by_name_in(&self.pool, name).await
    }

    pub async fn get_by_name_in<'e>(executor: impl Executor<'e>, name: impl AsRef<str>) -> Result<Option<Theme>> {
        let row: Option<ThemeRow> = sqlx::query_as(include_str!("../../queries/get_theme_by_name.sql"))
            .bind(name.as_ref().trim())
            .fetch_optional(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(Theme::from))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Theme>> {
        Self::get_by_id_in(&self.pool, id).await
    }

    pub async fn get_by_id_in<'e>(executor: impl Executor<'e>, id: i64) -> Result<Option<Theme>> {
        let row: Option<ThemeRow> = sqlx::query_as(include_str!("../../queries/get_theme_by_id.sql"))
            .bind(id)
            .fetch_optional(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(Theme::from))
    }

    /// All themes, sorted by name.
    pub async fn list(&self) -> Result<Vec<Theme>> {
        Self::list_in(&self.pool).await
    }

    pub async fn list_in<'e>(executor: impl Executor<'e>) -> Result<Vec<Theme>> {
        let rows: Vec<ThemeRow> = sqlx::query_as(include_str!("../../queries/list_themes.sql"))
            .fetch_all(executor)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Theme::from).collect())
    }
}
