//! The seam between statement building and a database driver.

use std::fmt::Debug;

use async_trait::async_trait;
use chronicle_core::repository::StoredEvent;
use chronicle_sql::{Dialect, Statement, Table};

use crate::error::SqlError;

/// Runs built statements against one database engine.
///
/// An executor knows how to bind [`chronicle_sql::SqlValue`]s for its engine
/// and how to map event rows (see [`crate::schema::SELECT_COLUMNS`]) back to
/// [`StoredEvent`]s.
#[async_trait]
pub trait SqlExecutor: Debug + Send + Sync {
    /// The dialect statements must be rendered in.
    fn dialect(&self) -> &dyn Dialect;

    /// DDL that creates `table` and its indexes if missing.
    fn schema_script(&self, table: &Table) -> String;

    /// Runs a query selecting event rows.
    async fn fetch_events(&self, statement: &Statement) -> Result<Vec<StoredEvent>, SqlError>;

    /// Runs every statement in one transaction, rolling back on the first
    /// failure. A unique violation reports the index of the failing statement.
    async fn execute_in_transaction(&self, statements: &[Statement]) -> Result<(), SqlError>;

    /// Runs a parameterless multi-statement script.
    async fn execute_script(&self, script: &str) -> Result<(), SqlError>;
}
