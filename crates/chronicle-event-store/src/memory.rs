//! In-process `EventStore` for tests, demos and single-process use.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::{debug, instrument};

use chronicle_core::error::DomainError;
use chronicle_core::event::AggregateId;
use chronicle_core::repository::{EventStore, StoredEvent};

#[derive(Debug, Default)]
struct Log {
    events: Vec<StoredEvent>,
    last_seq: i64,
}

/// Event store keeping every record in memory.
///
/// Clones share the same log. A `persist_raw` call is validated in full
/// before anything is appended, so a conflicting batch leaves no trace.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events across all aggregates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().events.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().events.is_empty()
    }

    /// Every stored event in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StoredEvent> {
        self.read().events.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Log> {
        self.log.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Log> {
        self.log.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn select(&self, matches: impl Fn(&StoredEvent) -> bool) -> Vec<StoredEvent> {
        let mut events: Vec<StoredEvent> = self
            .read()
            .events
            .iter()
            .filter(|e| matches(e))
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.aggregate_id
                .cmp(&b.aggregate_id)
                .then(a.version.cmp(&b.version))
        });
        events
    }
}

fn conflict(event: &StoredEvent) -> DomainError {
    DomainError::VersionConflict {
        aggregate_type: event.aggregate_type.clone(),
        aggregate_id: event.aggregate_id.clone(),
        version: event.version,
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn load_raw(
        &self,
        aggregate_type: &str,
        aggregate_id: &AggregateId,
        version_ceiling: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.select(|e| {
            e.aggregate_type == aggregate_type
                && &e.aggregate_id == aggregate_id
                && version_ceiling.is_none_or(|ceiling| e.version <= ceiling)
        }))
    }

    async fn load_raw_many(
        &self,
        aggregate_type: &str,
        aggregate_ids: &[AggregateId],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let wanted: HashSet<&AggregateId> = aggregate_ids.iter().collect();
        Ok(self.select(|e| e.aggregate_type == aggregate_type && wanted.contains(&e.aggregate_id)))
    }

    async fn load_raw_all(&self, aggregate_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.select(|e| e.aggregate_type == aggregate_type))
    }

    #[instrument(skip_all, fields(event_count = events.len()))]
    async fn persist_raw(&self, events: &[StoredEvent]) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }
        let mut log = self.write();

        let mut streams: HashSet<(&str, &AggregateId, i64)> = log
            .events
            .iter()
            .map(|e| (e.aggregate_type.as_str(), &e.aggregate_id, e.version))
            .collect();
        let mut ids: HashSet<uuid::Uuid> = log.events.iter().map(|e| e.event_id).collect();
        for event in events {
            let key = (event.aggregate_type.as_str(), &event.aggregate_id, event.version);
            if !streams.insert(key) || !ids.insert(event.event_id) {
                return Err(conflict(event));
            }
        }
        drop(streams);

        for event in events {
            log.last_seq += 1;
            let mut record = event.clone();
            record.storage_seq = Some(log.last_seq);
            log.events.push(record);
        }
        debug!(total = log.events.len(), "appended events");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chronicle_test_support::fixtures::stored_event;

    use super::*;

    #[tokio::test]
    async fn test_persist_assigns_increasing_storage_sequence() {
        // Arrange
        let store = InMemoryEventStore::new();

        // Act
        store
            .persist_raw(&[stored_event("todo", "a", 1), stored_event("todo", "b", 1)])
            .await
            .unwrap();
        store.persist_raw(&[stored_event("todo", "a", 2)]).await.unwrap();

        // Assert
        let seqs: Vec<_> = store.snapshot().iter().map(|e| e.storage_seq).collect();
        assert_eq!(seqs, vec![Some(1), Some(2), Some(3)]);
    }

    #[tokio::test]
    async fn test_conflicting_batch_appends_nothing() {
        // Arrange
        let store = InMemoryEventStore::new();
        store.persist_raw(&[stored_event("todo", "a", 1)]).await.unwrap();

        // Act
        let result = store
            .persist_raw(&[stored_event("todo", "b", 1), stored_event("todo", "a", 1)])
            .await;

        // Assert
        match result {
            Err(DomainError::VersionConflict {
                aggregate_id,
                version,
                ..
            }) => {
                assert_eq!(aggregate_id, AggregateId::new("a"));
                assert_eq!(version, 1);
            }
            other => panic!("expected VersionConflict, got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_version_within_batch_conflicts() {
        let store = InMemoryEventStore::new();

        let result = store
            .persist_raw(&[stored_event("todo", "a", 1), stored_event("todo", "a", 1)])
            .await;

        assert!(result.unwrap_err().is_conflict());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_same_version_under_another_aggregate_type_is_allowed() {
        let store = InMemoryEventStore::new();

        store
            .persist_raw(&[stored_event("todo", "a", 1), stored_event("note", "a", 1)])
            .await
            .unwrap();

        assert_eq!(store.load_raw_all("note").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_the_log() {
        let store = InMemoryEventStore::new();
        let clone = store.clone();

        clone.persist_raw(&[stored_event("todo", "a", 1)]).await.unwrap();

        assert_eq!(store.len(), 1);
    }
}
