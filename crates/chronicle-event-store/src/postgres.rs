//! `PostgreSQL` executor.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, instrument};

use chronicle_core::event::{AggregateId, DeleteAction};
use chronicle_core::repository::StoredEvent;
use chronicle_sql::{Dialect, PostgresDialect, SqlValue, Statement, Table};

use crate::error::SqlError;
use crate::executor::SqlExecutor;
use crate::schema;

/// PostgreSQL-backed statement executor.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// Creates a new `PgExecutor`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool of at most `max_connections` against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `SqlError::Database` if the database cannot be reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, SqlError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn bind<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Text(value) => query.bind(value.as_str()),
            SqlValue::BigInt(value) => query.bind(*value),
            SqlValue::SmallInt(value) => query.bind(*value),
            SqlValue::Uuid(value) => query.bind(*value),
            SqlValue::Timestamp(value) => query.bind(*value),
        };
    }
    query
}

fn decode(row: &PgRow) -> Result<StoredEvent, SqlError> {
    let delete_action = DeleteAction::from_code(row.try_get("delete_action")?)
        .map_err(|e| SqlError::Decode(e.to_string()))?;
    Ok(StoredEvent {
        storage_seq: Some(row.try_get("storage_seq")?),
        event_id: row.try_get("id")?,
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
impl SqlExecutor for PgExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &PostgresDialect
    }

    fn schema_script(&self, table: &Table) -> String {
        schema::postgres(table)
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
