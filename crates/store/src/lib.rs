//! SQLite persistence for generated digests.
//!
//! A digest is stored with three kinds of relationship: the articles it was
//! built from (with their citation position), the themes its article groups
//! fall under, and the citation records resolved from its summary. They are
//! always written together, in one transaction, by [`DigestWriter`].
//!
//! # Architecture
//! - [`Database`]: the connection pool, with migrations embedded.
//! - [`ArticleStore`] / [`ThemeStore`]: the records digests point at. Every
//!   method also has an `_in` variant taking an [`Executor`], so it can run
//!   inside someone else's transaction.
//! - [`DigestWriter`]: the atomic write, reporting what it linked and what it
//!   skipped in a [`StoreReport`].
//! - [`DigestRepository`]: reading digests back, checking for and deleting
//!   them.

mod db;
pub mod error;
mod executor;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::executor::Executor;
pub use crate::models::{NewArticle, PersistedDigest};
pub use crate::repo::{ArticleStore, DigestRepository, DigestWriter, StoreReport, ThemeStore};
