//! Relational `EventStore` over any [`SqlExecutor`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use chronicle_core::error::DomainError;
use chronicle_core::event::AggregateId;
use chronicle_core::repository::{EventStore, StoredEvent};
use chronicle_sql::{Condition, Insert, Order, Select, SqlValue, Statement, Table};

use crate::error::SqlError;
use crate::executor::SqlExecutor;
use crate::schema::{DEFAULT_EVENTS_TABLE, INSERT_COLUMNS, SELECT_COLUMNS};

/// Event store persisting to one table through a [`SqlExecutor`].
///
/// Each saved event is one row. Writes from a single `persist_raw` call run
/// in one transaction, and the unique stream index turns a concurrent write
/// of the same version into `DomainError::VersionConflict`.
#[derive(Debug, Clone)]
pub struct SqlEventStore {
    executor: Arc<dyn SqlExecutor>,
    table: Table,
}

impl SqlEventStore {
    /// Creates a store over the default `events` table.
    #[must_use]
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            executor,
            table: Table::new(DEFAULT_EVENTS_TABLE),
        }
    }

    /// Uses `table` instead of the default.
    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        self.table = table;
        self
    }

    /// Creates the events table and its indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Storage` if the DDL fails.
    #[instrument(skip(self), fields(dialect = self.executor.dialect().name()))]
    pub async fn create_schema(&self) -> Result<(), DomainError> {
        let script = self.executor.schema_script(&self.table);
        self.executor.execute_script(&script).await?;
        debug!(table = self.table.name(), "events table ready");
        Ok(())
    }

    fn select(&self) -> Select {
        Select::from(self.table.clone()).columns(&SELECT_COLUMNS)
    }

    /// Query for one stream, optionally capped at `version_ceiling`.
    #[must_use]
    pub fn load_statement(
        &self,
        aggregate_type: &str,
        aggregate_id: &AggregateId,
        version_ceiling: Option<i64>,
    ) -> Statement {
        let mut select = self
            .select()
            .filter(Condition::eq("aggregate_type", aggregate_type))
            .filter(Condition::eq("aggregate_id", aggregate_id.as_str()));
        if let Some(ceiling) = version_ceiling {
            select = select.filter(Condition::lt_eq("version", ceiling));
        }
        select
            .order_by("version", Order::Asc)
            .build(self.executor.dialect())
    }

    /// Query for several streams of one kind.
    #[must_use]
    pub fn load_many_statement(&self, aggregate_type: &str, aggregate_ids: &[AggregateId]) -> Statement {
        self.select()
            .filter(Condition::eq("aggregate_type", aggregate_type))
            .filter(Condition::in_list(
                "aggregate_id",
                aggregate_ids.iter().map(AggregateId::as_str),
            ))
            .order_by("aggregate_id", Order::Asc)
            .order_by("version", Order::Asc)
            .build(self.executor.dialect())
    }

    /// Query for every stream of one kind.
    #[must_use]
    pub fn load_all_statement(&self, aggregate_type: &str) -> Statement {
        self.select()
            .filter(Condition::eq("aggregate_type", aggregate_type))
            .order_by("aggregate_id", Order::Asc)
            .order_by("version", Order::Asc)
            .build(self.executor.dialect())
    }

    /// One INSERT per event, in input order.
    ///
    /// # Errors
    ///
    /// Returns `SqlError::Build` if a statement cannot be rendered.
    pub fn insert_statements(&self, events: &[StoredEvent]) -> Result<Vec<Statement>, SqlError> {
        events
            .iter()
            .map(|event| {
                Insert::into(self.table.clone())
                    .columns(&INSERT_COLUMNS)
                    .values(row(event))
                    .build(self.executor.dialect())
                    .map_err(SqlError::from)
            })
            .collect()
    }
}

fn row(event: &StoredEvent) -> Vec<SqlValue> {
    vec![
        event.event_id.into(),
        event.actor_id.clone().into(),
        event.occurred_on.into(),
        event.version.into(),
        event.delete_action.code().into(),
        event.aggregate_type.as_str().into(),
        event.aggregate_id.as_str().into(),
        event.event_type.as_str().into(),
        event.event_data.as_str().into(),
    ]
}

#[async_trait]
impl EventStore for SqlEventStore {
    #[instrument(skip(self), fields(dialect = self.executor.dialect().name()))]
    async fn load_raw(
        &self,
        aggregate_type: &str,
        aggregate_id: &AggregateId,
        version_ceiling: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let statement = self.load_statement(aggregate_type, aggregate_id, version_ceiling);
        Ok(self.executor.fetch_events(&statement).await?)
    }

    #[instrument(skip(self, aggregate_ids), fields(dialect = self.executor.dialect().name(), requested = aggregate_ids.len()))]
    async fn load_raw_many(
        &self,
        aggregate_type: &str,
        aggregate_ids: &[AggregateId],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        if aggregate_ids.is_empty() {
            return Ok(Vec::new());
        }
        let statement = self.load_many_statement(aggregate_type, aggregate_ids);
        Ok(self.executor.fetch_events(&statement).await?)
    }

    #[instrument(skip(self), fields(dialect = self.executor.dialect().name()))]
    async fn load_raw_all(&self, aggregate_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        let statement = self.load_all_statement(aggregate_type);
        Ok(self.executor.fetch_events(&statement).await?)
    }

    #[instrument(skip_all, fields(dialect = self.executor.dialect().name(), event_count = events.len()))]
    async fn persist_raw(&self, events: &[StoredEvent]) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }
        let statements = self.insert_statements(events)?;
        match self.executor.execute_in_transaction(&statements).await {
            Ok(()) => {
                debug!("committed event rows");
                Ok(())
            }
            Err(SqlError::UniqueViolation { statement }) => {
                let event = &events[statement.min(events.len() - 1)];
                Err(DomainError::VersionConflict {
                    aggregate_type: event.aggregate_type.clone(),
                    aggregate_id: event.aggregate_id.clone(),
                    version: event.version,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
