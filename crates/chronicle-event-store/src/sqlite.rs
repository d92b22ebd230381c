//! `SQLite` executor.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::query::Query;
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use chronicle_core::event::{AggregateId, DeleteAction};
use chronicle_core::repository::StoredEvent;
use chronicle_sql::{Dialect, SqlValue, SqliteDialect, Statement, Table};

use crate::error::SqlError;
use crate::executor::SqlExecutor;
use crate::schema;

/// SQLite-backed statement executor.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Creates a new `SqliteExecutor`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`, creating the file if missing.
    ///
    /// # Errors
    ///
    /// Returns `SqlError::Database` if the URL is invalid or the database
    /// cannot be opened.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, SqlError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds a single connection that is never recycled, since each
    /// connection to `sqlite::memory:` sees its own empty database.
    ///
    /// # Errors
    ///
    /// Returns `SqlError::Database` if the connection cannot be opened.
    pub async fn in_memory() -> Result<Self, SqlError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn bind<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Text(value) => query.bind(value.as_str()),
            SqlValue::BigInt(value) => query.bind(*value),
            SqlValue::SmallInt(value) => query.bind(*value),
            SqlValue::Uuid(value) => query.bind(value.to_string()),
            SqlValue::Timestamp(value) => query.bind(*value),
        };
    }
    query
}

fn decode(row: &SqliteRow) -> Result<StoredEvent, SqlError> {
    let id: String = row.try_get("id")?;
    let event_id = Uuid::parse_str(&id).map_err(|e| SqlError::Decode(format!("id {id}: {e}")))?;
    let delete_action = DeleteAction::from_code(row.try_get("delete_action")?)
        .map_err(|e| SqlError::Decode(e.to_string()))?;
    Ok(StoredEvent {
        storage_seq: Some(row.try_get("storage_seq")?),
        event_id,
        actor_id: row.try_get("actor_id")?,
        occurred_on: row.try_get("occurred_on")?,
        version: row.try_get("version")?,
        delete_action,
        aggregate_type: row.try_get("aggregate_type")?,
        aggregate_id: AggregateId::new(row.try_get::<String, _>("aggregate_id")?),
        event_type: row.try_get("event_type")?,
        event_data: row.try_get("event_data")?,
    })
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn schema_script(&self, table: &Table) -> String {
        schema::sqlite(table)
    }

    #[instrument(skip_all)]
    async fn fetch_events(&self, statement: &Statement) -> Result<Vec<StoredEvent>, SqlError> {
        let rows = bind(sqlx::query(&statement.text), &statement.params)
            .fetch_all(&self.pool)
            .await?;
        debug!(rows = rows.len(), "fetched event rows");
        rows.iter().map(decode).collect()
    }

    #[instrument(skip_all, fields(statements = statements.len()))]
    async fn execute_in_transaction(&self, statements: &[Statement]) -> Result<(), SqlError> {
        let mut tx = self.pool.begin().await?;
        for (index, statement) in statements.iter().enumerate() {
            bind(sqlx::query(&statement.text), &statement.params)
                .execute(&mut *tx)
                .await
                .map_err(|e| SqlError::at_statement(index, e))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<(), SqlError> {
        sqlx::raw_sql(script).execute(&self.pool).await?;
        Ok(())
    }
}
