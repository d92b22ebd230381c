//! Domain event abstractions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Opaque identifier of one aggregate instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(String);

impl AggregateId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, time-ordered identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AggregateId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AggregateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Soft-delete marker carried by every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteAction {
    /// The event does not change deletion state.
    #[default]
    None,
    /// The event soft-deletes the aggregate.
    Delete,
    /// The event restores a soft-deleted aggregate.
    Undelete,
}

impl DeleteAction {
    /// Storage code for this action.
    #[must_use]
    pub fn code(self) -> i16 {
        match self {
            Self::None => 0,
            Self::Delete => 1,
            Self::Undelete => 2,
        }
    }

    /// Decodes a storage code.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Storage` for codes outside `0..=2`.
    pub fn from_code(code: i16) -> Result<Self, DomainError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Delete),
            2 => Ok(Self::Undelete),
            other => Err(DomainError::Storage(format!(
                "invalid delete_action code {other}"
            ))),
        }
    }
}

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: AggregateId,
    /// Kind of the aggregate this event belongs to.
    pub aggregate_type: String,
    /// Contiguous version within the aggregate stream, starting at 1.
    pub version: i64,
    /// Who caused the event; `None` means the system did.
    pub actor_id: Option<String>,
    /// Timestamp of event creation.
    pub occurred_on: DateTime<Utc>,
    /// Soft-delete effect of this event.
    pub delete_action: DeleteAction,
}

/// Trait implemented by each aggregate kind's closed event enum.
pub trait EventKind: Clone + fmt::Debug + Send + Sync + 'static {
    /// Returns the registered type tag of this variant.
    fn event_type(&self) -> &'static str;

    /// Serializes the variant's payload (without the tag).
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be represented.
    fn to_data(&self) -> Result<serde_json::Value, serde_json::Error>;
}

/// A domain event: metadata plus a variant of the aggregate's event enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<K> {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: K,
}

impl<K> Event<K> {
    /// Shorthand for `self.metadata.version`.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.metadata.version
    }
}

/// An event that has not yet been assigned a place in an aggregate's history.
#[derive(Debug, Clone)]
pub struct PendingEvent<K> {
    /// Event-specific payload.
    pub kind: K,
    /// Who caused the event.
    pub actor_id: Option<String>,
    /// Timestamp of event creation.
    pub occurred_on: DateTime<Utc>,
    /// Soft-delete effect.
    pub delete_action: DeleteAction,
}

impl<K> PendingEvent<K> {
    /// Creates a pending event caused by the system with no deletion effect.
    #[must_use]
    pub fn new(kind: K, occurred_on: DateTime<Utc>) -> Self {
        Self {
            kind,
            actor_id: None,
            occurred_on,
            delete_action: DeleteAction::None,
        }
    }

    /// Attributes the event to an actor.
    #[must_use]
    pub fn with_actor(mut self, actor_id: Option<String>) -> Self {
        self.actor_id = actor_id;
        self
    }

    /// Marks the event as soft-deleting its aggregate.
    #[must_use]
    pub fn deleting(mut self) -> Self {
        self.delete_action = DeleteAction::Delete;
        self
    }

    /// Marks the event as restoring its aggregate.
    #[must_use]
    pub fn undeleting(mut self) -> Self {
        self.delete_action = DeleteAction::Undelete;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_action_codes_round_trip() {
        for action in [DeleteAction::None, DeleteAction::Delete, DeleteAction::Undelete] {
            assert_eq!(DeleteAction::from_code(action.code()).unwrap(), action);
        }
    }

    #[test]
    fn test_delete_action_rejects_unknown_code() {
        let result = DeleteAction::from_code(7);

        match result {
            Err(DomainError::Storage(msg)) => assert!(msg.contains('7')),
            other => panic!("expected Storage, got {other:?}"),
        }
    }

    #[test]
    fn test_generated_aggregate_ids_are_distinct() {
        assert_ne!(AggregateId::generate(), AggregateId::generate());
    }

    #[test]
    fn test_aggregate_id_serializes_as_plain_string() {
        let id = AggregateId::new("todo-1");

        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("todo-1"));
    }
}
