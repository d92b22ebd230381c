//! Aggregate root abstraction.

use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{AggregateId, DeleteAction, Event, EventKind, EventMetadata, PendingEvent};

/// Versioning and change-tracking state embedded in every aggregate root.
#[derive(Debug, Clone)]
pub struct EventHistory<K> {
    id: AggregateId,
    version: i64,
    is_deleted: bool,
    committed: Vec<Event<K>>,
    pending: Vec<Event<K>>,
}

impl<K> EventHistory<K> {
    /// Creates the history of an aggregate with no events applied.
    #[must_use]
    pub fn new(id: AggregateId) -> Self {
        Self {
            id,
            version: 0,
            is_deleted: false,
            committed: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// The aggregate identifier.
    #[must_use]
    pub fn id(&self) -> &AggregateId {
        &self.id
    }

    /// Version of the last applied event, 0 if none.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Whether the applied events leave the aggregate soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Events already applied and known to be persisted.
    #[must_use]
    pub fn committed(&self) -> &[Event<K>] {
        &self.committed
    }

    /// Events applied in memory but not yet persisted.
    #[must_use]
    pub fn pending(&self) -> &[Event<K>] {
        &self.pending
    }

    fn advance(&mut self, metadata: &EventMetadata) {
        self.version = metadata.version;
        match metadata.delete_action {
            DeleteAction::Delete => self.is_deleted = true,
            DeleteAction::Undelete => self.is_deleted = false,
            DeleteAction::None => {}
        }
    }

    fn record_committed(&mut self, event: Event<K>) {
        self.advance(&event.metadata);
        self.committed.push(event);
    }

    fn record_pending(&mut self, event: Event<K>) {
        self.advance(&event.metadata);
        self.pending.push(event);
    }

    fn commit_pending(&mut self) {
        self.committed.append(&mut self.pending);
    }
}

/// Trait for aggregate roots that reconstitute from event history.
///
/// Implementors own the domain fields and an [`EventHistory`]; the provided
/// methods implement replay, version assignment and pending-change tracking
/// on top of the required `apply`.
pub trait AggregateRoot: Send + Sync + Sized {
    /// The closed event enum this aggregate produces and consumes.
    type Event: EventKind;

    /// Stable name stored in the `aggregate_type` column.
    const AGGREGATE_TYPE: &'static str;

    /// Creates an aggregate with no events applied.
    fn empty(id: AggregateId) -> Self;

    /// Returns the embedded event history.
    fn history(&self) -> &EventHistory<Self::Event>;

    /// Returns the embedded event history mutably.
    fn history_mut(&mut self) -> &mut EventHistory<Self::Event>;

    /// Mutates domain fields for one event. Must not touch the history.
    fn apply(&mut self, event: &Self::Event);

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> &AggregateId {
        self.history().id()
    }

    /// Returns the version of the last applied event.
    fn version(&self) -> i64 {
        self.history().version()
    }

    /// Returns `true` if the aggregate is soft-deleted.
    fn is_deleted(&self) -> bool {
        self.history().is_deleted()
    }

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Event<Self::Event>] {
        self.history().pending()
    }

    /// Returns `true` if there are events awaiting persistence.
    fn has_pending_changes(&self) -> bool {
        !self.history().pending().is_empty()
    }

    /// Rebuilds an aggregate from its stored history.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CorruptHistory` when the events are not
    /// contiguous from version 1 or belong to another aggregate.
    fn replay<I>(id: AggregateId, events: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = Event<Self::Event>>,
    {
        let mut aggregate = Self::empty(id);
        for event in events {
            let expected = aggregate.version() + 1;
            if event.metadata.version != expected
                || event.metadata.aggregate_id != *aggregate.aggregate_id()
            {
                return Err(DomainError::CorruptHistory {
                    aggregate_id: aggregate.aggregate_id().clone(),
                    expected,
                    found_aggregate_id: event.metadata.aggregate_id.clone(),
                    found: event.metadata.version,
                });
            }
            aggregate.apply(&event.kind);
            aggregate.history_mut().record_committed(event);
        }
        Ok(aggregate)
    }

    /// Assigns the next version to `pending`, applies it immediately and
    /// queues it for persistence. Returns the assigned version.
    fn raise(&mut self, pending: PendingEvent<Self::Event>) -> i64 {
        let version = self.version() + 1;
        let event = Event {
            metadata: EventMetadata {
                event_id: Uuid::now_v7(),
                aggregate_id: self.aggregate_id().clone(),
                aggregate_type: Self::AGGREGATE_TYPE.to_owned(),
                version,
                actor_id: pending.actor_id,
                occurred_on: pending.occurred_on,
                delete_action: pending.delete_action,
            },
            kind: pending.kind,
        };
        self.apply(&event.kind);
        self.history_mut().record_pending(event);
        version
    }

    /// Moves pending events into the committed history after persistence.
    fn clear_uncommitted_events(&mut self) {
        self.history_mut().commit_pending();
    }
}
