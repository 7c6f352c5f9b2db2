//! Where a statement runs.
//!
//! Every store method exists in two flavours: one that runs on the pool
//! (`get_by_url`) and one that runs on a caller-provided executor
//! (`get_by_url_in`). The latter is how the digest writer reads themes and
//! writes rows inside its own transaction, without any branching inside the
//! stores themselves.

use sqlx::sqlite::{SqliteConnection, SqlitePool};

/// Anything that can run a parameterised statement against the database.
///
/// There are exactly two implementations:
/// - `&SqlitePool`: an ambient connection checked out per statement.
/// - `&mut SqliteConnection`: an active transaction, obtained by
///   dereferencing a [`sqlx::Transaction`] (`&mut *tx`).
pub trait Executor<'e>: sqlx::SqliteExecutor<'e> {}

impl<'e> Executor<'e> for &'e SqlitePool {}
impl<'e> Executor<'e> for &'e mut SqliteConnection {}
