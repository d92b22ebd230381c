//! Test stores: mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chronicle_core::error::DomainError;
use chronicle_core::event::AggregateId;
use chronicle_core::repository::{EventStore, StoredEvent};

/// An event store that returns a fixed stream from every load and records
/// every persisted batch.
#[derive(Debug, Default)]
pub struct RecordingEventStore {
    load_result: Vec<StoredEvent>,
    persisted: Mutex<Vec<Vec<StoredEvent>>>,
}

impl RecordingEventStore {
    /// Create a store that will return `load_result` from every load.
    #[must_use]
    pub fn new(load_result: Vec<StoredEvent>) -> Self {
        Self {
            load_result,
            persisted: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every batch passed to `persist_raw`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn persisted_batches(&self) -> Vec<Vec<StoredEvent>> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn load_raw(
        &self,
        _aggregate_type: &str,
        _aggregate_id: &AggregateId,
        version_ceiling: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .load_result
            .iter()
            .filter(|e| version_ceiling.is_none_or(|max| e.version <= max))
            .cloned()
            .collect())
    }

    async fn load_raw_many(
        &self,
        _aggregate_type: &str,
        aggregate_ids: &[AggregateId],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .load_result
            .iter()
            .filter(|e| aggregate_ids.contains(&e.aggregate_id))
            .cloned()
            .collect())
    }

    async fn load_raw_all(&self, _aggregate_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.clone())
    }

    async fn persist_raw(&self, events: &[StoredEvent]) -> Result<(), DomainError> {
        self.persisted.lock().unwrap().push(events.to_vec());
        Ok(())
    }
}

/// An event store that always fails with a storage error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn load_raw(
        &self,
        _aggregate_type: &str,
        _aggregate_id: &AggregateId,
        _version_ceiling: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn load_raw_many(
        &self,
        _aggregate_type: &str,
        _aggregate_ids: &[AggregateId],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn load_raw_all(&self, _aggregate_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn persist_raw(&self, _events: &[StoredEvent]) -> Result<(), DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }
}
