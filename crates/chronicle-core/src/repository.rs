//! Event repository abstraction.
//!
//! Backends implement [`EventStore`], four raw primitives over stored
//! records. [`AggregateRepository`] implements loading, replay, persistence
//! and publication once on top of them, so every backend behaves the same.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::bus::EventBus;
use crate::codec::EventCodec;
use crate::error::DomainError;
use crate::event::{AggregateId, DeleteAction};

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Backend-assigned insertion sequence; `None` until persisted.
    pub storage_seq: Option<i64>,
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Who caused the event; `None` means the system did.
    pub actor_id: Option<String>,
    /// Timestamp of event creation.
    pub occurred_on: DateTime<Utc>,
    /// Version within the aggregate stream.
    pub version: i64,
    /// Soft-delete effect.
    pub delete_action: DeleteAction,
    /// Kind of the owning aggregate.
    pub aggregate_type: String,
    /// Owning aggregate.
    pub aggregate_id: AggregateId,
    /// Registered type tag.
    pub event_type: String,
    /// JSON payload text.
    pub event_data: String,
}

/// Raw persistence primitives every backend implements.
///
/// Reads return events ordered by ascending version within each aggregate.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load the events of one aggregate, optionally up to `version_ceiling`.
    async fn load_raw(
        &self,
        aggregate_type: &str,
        aggregate_id: &AggregateId,
        version_ceiling: Option<i64>,
    ) -> Result<Vec<StoredEvent>, DomainError>;

    /// Load the events of several aggregates of one kind.
    async fn load_raw_many(
        &self,
        aggregate_type: &str,
        aggregate_ids: &[AggregateId],
    ) -> Result<Vec<StoredEvent>, DomainError>;

    /// Load the events of every aggregate of one kind.
    async fn load_raw_all(&self, aggregate_type: &str) -> Result<Vec<StoredEvent>, DomainError>;

    /// Persist events atomically. A `(aggregate_type, aggregate_id, version)`
    /// that already exists fails the call with `DomainError::VersionConflict`.
    async fn persist_raw(&self, events: &[StoredEvent]) -> Result<(), DomainError>;
}

/// Loads and saves aggregates of kind `T` through a backend, a codec and a bus.
pub struct AggregateRepository<T: AggregateRoot> {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn EventBus>,
    codec: Arc<EventCodec<T::Event>>,
    outbox: Arc<Mutex<VecDeque<StoredEvent>>>,
    publish_gate: Arc<tokio::sync::Mutex<()>>,
}

impl<T: AggregateRoot> AggregateRepository<T> {
    /// Creates a repository for aggregate kind `T`.
    #[must_use]
    pub fn new(
        store: Arc<dyn EventStore>,
        bus: Arc<dyn EventBus>,
        codec: Arc<EventCodec<T::Event>>,
    ) -> Self {
        Self {
            store,
            bus,
            codec,
            outbox: Arc::new(Mutex::new(VecDeque::new())),
            publish_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Returns the codec this repository decodes with.
    #[must_use]
    pub fn codec(&self) -> &EventCodec<T::Event> {
        &self.codec
    }

    /// Loads one aggregate.
    ///
    /// Returns `None` when the aggregate has no events, or when it is
    /// soft-deleted and neither `include_deleted` nor `version_ceiling` is
    /// given. A ceiling asks for a historical snapshot, which is returned
    /// regardless of deletion.
    ///
    /// # Errors
    ///
    /// Returns backend errors with context, codec errors, or
    /// `DomainError::CorruptHistory`.
    #[instrument(skip(self), fields(aggregate_type = T::AGGREGATE_TYPE))]
    pub async fn load(
        &self,
        aggregate_id: &AggregateId,
        version_ceiling: Option<i64>,
        include_deleted: bool,
    ) -> Result<Option<T>, DomainError> {
        let records = self
            .store
            .load_raw(T::AGGREGATE_TYPE, aggregate_id, version_ceiling)
            .await
            .map_err(|e| e.with_context(format!("loading {} {aggregate_id}", T::AGGREGATE_TYPE)))?;
        debug!(event_count = records.len(), "loaded raw events");
        if records.is_empty() {
            return Ok(None);
        }
        let aggregate = self.rehydrate(aggregate_id.clone(), &records)?;
        Ok(visible(
            aggregate,
            include_deleted || version_ceiling.is_some(),
        ))
    }

    /// Loads the current, non-deleted state of one aggregate.
    ///
    /// # Errors
    ///
    /// See [`AggregateRepository::load`].
    pub async fn get(&self, aggregate_id: &AggregateId) -> Result<Option<T>, DomainError> {
        self.load(aggregate_id, None, false).await
    }

    /// Returns `true` if the aggregate has any events, deleted or not.
    ///
    /// # Errors
    ///
    /// Returns backend errors with context.
    pub async fn exists(&self, aggregate_id: &AggregateId) -> Result<bool, DomainError> {
        let records = self
            .store
            .load_raw(T::AGGREGATE_TYPE, aggregate_id, Some(1))
            .await
            .map_err(|e| e.with_context(format!("checking {} {aggregate_id}", T::AGGREGATE_TYPE)))?;
        Ok(!records.is_empty())
    }

    /// Loads several aggregates in request order, skipping ids with no
    /// events and applying the deletion rule per aggregate.
    ///
    /// # Errors
    ///
    /// See [`AggregateRepository::load`].
    #[instrument(skip(self, aggregate_ids), fields(aggregate_type = T::AGGREGATE_TYPE, requested = aggregate_ids.len()))]
    pub async fn load_many(
        &self,
        aggregate_ids: &[AggregateId],
        include_deleted: bool,
    ) -> Result<Vec<T>, DomainError> {
        let mut seen = HashSet::new();
        let ids: Vec<AggregateId> = aggregate_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = self
            .store
            .load_raw_many(T::AGGREGATE_TYPE, &ids)
            .await
            .map_err(|e| e.with_context(format!("loading many {}", T::AGGREGATE_TYPE)))?;

        let mut streams: HashMap<AggregateId, Vec<StoredEvent>> = HashMap::new();
        for record in records {
            streams
                .entry(record.aggregate_id.clone())
                .or_default()
                .push(record);
        }

        let mut aggregates = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(stream) = streams.remove(&id) {
                let aggregate = self.rehydrate(id, &stream)?;
                aggregates.extend(visible(aggregate, include_deleted));
            }
        }
        Ok(aggregates)
    }

    /// Loads every aggregate of kind `T`, ordered by aggregate id.
    ///
    /// # Errors
    ///
    /// See [`AggregateRepository::load`].
    #[instrument(skip(self), fields(aggregate_type = T::AGGREGATE_TYPE))]
    pub async fn load_all(&self, include_deleted: bool) -> Result<Vec<T>, DomainError> {
        let records = self
            .store
            .load_raw_all(T::AGGREGATE_TYPE)
            .await
            .map_err(|e| e.with_context(format!("loading all {}", T::AGGREGATE_TYPE)))?;

        let mut streams: BTreeMap<AggregateId, Vec<StoredEvent>> = BTreeMap::new();
        for record in records {
            streams
                .entry(record.aggregate_id.clone())
                .or_default()
                .push(record);
        }

        let mut aggregates = Vec::with_capacity(streams.len());
        for (id, stream) in streams {
            let aggregate = self.rehydrate(id, &stream)?;
            aggregates.extend(visible(aggregate, include_deleted));
        }
        Ok(aggregates)
    }

    /// Persists and publishes the pending events of one aggregate.
    ///
    /// # Errors
    ///
    /// See [`AggregateRepository::save_all`].
    pub async fn save(&self, aggregate: &mut T) -> Result<(), DomainError> {
        self.save_all(std::slice::from_mut(aggregate)).await
    }

    /// Persists the pending events of every aggregate in one backend call,
    /// clears their pending lists, then publishes the events in version
    /// order. Aggregates without pending changes are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::VersionConflict` if another writer got there
    /// first (nothing from the batch is published and pending lists are kept),
    /// other backend errors with context, or `DomainError::Publication` if the
    /// bus rejects an event after the write. In the last case the events stay
    /// queued and are retried by the next `save` or `flush_outbox`.
    #[instrument(skip_all, fields(aggregate_type = T::AGGREGATE_TYPE, batch = aggregates.len()))]
    pub async fn save_all(&self, aggregates: &mut [T]) -> Result<(), DomainError> {
        if let Err(err) = self.flush_outbox().await {
            warn!(error = %err, "earlier events are still awaiting publication");
        }

        let mut records = Vec::new();
        for aggregate in aggregates.iter().filter(|a| a.has_pending_changes()) {
            for event in aggregate.uncommitted_events() {
                let mut record = self.codec.to_stored(event)?;
                record.aggregate_type = T::AGGREGATE_TYPE.to_owned();
                record.aggregate_id = aggregate.aggregate_id().clone();
                records.push(record);
            }
        }
        if records.is_empty() {
            debug!("nothing to save");
            return Ok(());
        }

        self.store
            .persist_raw(&records)
            .await
            .map_err(|e| e.with_context(format!("saving {}", T::AGGREGATE_TYPE)))?;
        debug!(event_count = records.len(), "persisted events");

        for aggregate in aggregates.iter_mut() {
            aggregate.clear_uncommitted_events();
        }
        self.lock_outbox().extend(records);

        self.flush_outbox().await.map(|_| ())
    }

    /// Publishes queued events in order until the queue is empty or the bus
    /// fails. Returns the number of events published.
    ///
    /// # Errors
    ///
    /// Returns the bus error; the failed event and everything after it stay
    /// queued.
    pub async fn flush_outbox(&self) -> Result<usize, DomainError> {
        let _gate = self.publish_gate.lock().await;
        let mut published = 0;
        loop {
            let next = self.lock_outbox().front().cloned();
            let Some(event) = next else {
                break;
            };
            if let Err(err) = self.bus.publish(&event).await {
                warn!(
                    event_id = %event.event_id,
                    aggregate_id = %event.aggregate_id,
                    version = event.version,
                    error = %err,
                    "event bus rejected committed event"
                );
                return Err(err.with_context(format!(
                    "publishing {} {} v{}",
                    event.aggregate_type, event.aggregate_id, event.version
                )));
            }
            self.lock_outbox().pop_front();
            published += 1;
        }
        Ok(published)
    }

    /// Number of committed events not yet accepted by the bus.
    #[must_use]
    pub fn pending_publications(&self) -> usize {
        self.lock_outbox().len()
    }

    fn lock_outbox(&self) -> MutexGuard<'_, VecDeque<StoredEvent>> {
        self.outbox.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn rehydrate(&self, id: AggregateId, records: &[StoredEvent]) -> Result<T, DomainError> {
        let events = records
            .iter()
            .map(|record| self.codec.from_stored(record))
            .collect::<Result<Vec<_>, _>>()?;
        T::replay(id, events)
    }
}

impl<T: AggregateRoot> Clone for AggregateRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            bus: Arc::clone(&self.bus),
            codec: Arc::clone(&self.codec),
            outbox: Arc::clone(&self.outbox),
            publish_gate: Arc::clone(&self.publish_gate),
        }
    }
}

impl<T: AggregateRoot> std::fmt::Debug for AggregateRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateRepository")
            .field("aggregate_type", &T::AGGREGATE_TYPE)
            .field("codec", &self.codec)
            .field("pending_publications", &self.pending_publications())
            .finish_non_exhaustive()
    }
}

fn visible<T: AggregateRoot>(aggregate: T, show_deleted: bool) -> Option<T> {
    (show_deleted || !aggregate.is_deleted()).then_some(aggregate)
}
