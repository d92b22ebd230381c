//! Shared application state.

use std::sync::Arc;

use chronicle_core::bus::{BroadcastEventBus, EventBus};
use chronicle_core::clock::{Clock, SystemClock};
use chronicle_core::repository::EventStore;
use chronicle_event_store::{InMemoryEventStore, PgExecutor, SqlEventStore, SqlExecutor, SqliteExecutor};
use chronicle_sql::Table;
use chronicle_todo::application::command_handlers::TodoRepository;
use chronicle_todo::domain::events::todo_event_codec;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Source of event timestamps.
    pub clock: Arc<dyn Clock>,
    /// Repository for to-do items.
    pub todos: TodoRepository,
    /// Name of the backing store, reported by `/health`.
    pub backend: &'static str,
}

impl AppState {
    /// Create new application state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the to-do codec cannot be built.
    pub fn new(
        clock: Arc<dyn Clock>,
        store: Arc<dyn EventStore>,
        bus: Arc<dyn EventBus>,
        backend: &'static str,
    ) -> Result<Self, AppError> {
        let todos = TodoRepository::new(store, bus, Arc::new(todo_event_codec()?));
        Ok(Self {
            clock,
            todos,
            backend,
        })
    }

    /// Opens the configured event store and wires the repository to `bus`.
    ///
    /// Relational stores get their events table created if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the database cannot be reached, or
    /// `AppError::Store` if the schema cannot be created.
    pub async fn connect(config: &Config, bus: BroadcastEventBus) -> Result<Self, AppError> {
        let store: Arc<dyn EventStore> = match config.store_backend {
            StoreBackend::Memory => Arc::new(InMemoryEventStore::new()),
            StoreBackend::Postgres | StoreBackend::Sqlite => {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    AppError::Config("DATABASE_URL must be set for relational backends".into())
                })?;
                let executor: Arc<dyn SqlExecutor> = if config.store_backend == StoreBackend::Postgres {
                    Arc::new(PgExecutor::connect(url, config.max_connections).await?)
                } else {
                    Arc::new(SqliteExecutor::connect(url, config.max_connections).await?)
                };
                let mut table = Table::new(config.events_table.clone());
                if let Some(schema) = &config.events_schema {
                    table = table.in_schema(schema.clone());
                }
                let store = SqlEventStore::new(executor).with_table(table);
                store.create_schema().await?;
                Arc::new(store)
            }
        };
        info!(backend = config.store_backend.name(), "event store ready");
        Self::new(
            Arc::new(SystemClock),
            store,
            Arc::new(bus),
            config.store_backend.name(),
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("todos", &self.todos)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}
