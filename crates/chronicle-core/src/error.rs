//! Domain error types.

use thiserror::Error;

use crate::event::AggregateId;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A stored or outgoing event carries a type tag with no registered mapping.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// The same type tag was registered twice on one codec.
    #[error("event type registered twice: {0}")]
    DuplicateEventType(String),

    /// An event payload could not be parsed into its registered shape.
    #[error("malformed payload for event type {event_type}: {reason}")]
    MalformedPayload {
        /// The type tag of the offending event.
        event_type: String,
        /// Parser diagnostics.
        reason: String,
    },

    /// A replayed history is non-contiguous, out of order, or foreign.
    #[error(
        "corrupt history for aggregate {aggregate_id}: expected version {expected}, found {found_aggregate_id} version {found}"
    )]
    CorruptHistory {
        /// The aggregate being replayed.
        aggregate_id: AggregateId,
        /// The version the replay expected next.
        expected: i64,
        /// The aggregate the offending event belongs to.
        found_aggregate_id: AggregateId,
        /// The version actually encountered.
        found: i64,
    },

    /// Optimistic concurrency conflict.
    #[error("version conflict on {aggregate_type} {aggregate_id}: version {version} already exists")]
    VersionConflict {
        /// The aggregate kind.
        aggregate_type: String,
        /// The aggregate that had the conflict.
        aggregate_id: AggregateId,
        /// The version another writer already committed.
        version: i64,
    },

    /// A backing store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// The event bus rejected a committed event.
    #[error("publication error: {0}")]
    Publication(String),

    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(AggregateId),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// Prefixes storage and publication messages with `context`. Other
    /// variants already name the aggregate involved and pass through as-is.
    #[must_use]
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Self::Storage(message) => Self::Storage(format!("{context}: {message}")),
            Self::Publication(message) => Self::Publication(format!("{context}: {message}")),
            other => other,
        }
    }

    /// Returns `true` for errors a caller may resolve by reloading and retrying.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_prefixes_storage_message() {
        let err = DomainError::Storage("connection refused".into()).with_context("loading todo 1");

        match err {
            DomainError::Storage(msg) => assert_eq!(msg, "loading todo 1: connection refused"),
            other => panic!("expected Storage, got {other:?}"),
        }
    }

    #[test]
    fn test_with_context_leaves_conflict_untouched() {
        let err = DomainError::VersionConflict {
            aggregate_type: "todo".into(),
            aggregate_id: AggregateId::new("a"),
            version: 4,
        }
        .with_context("saving");

        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "version conflict on todo a: version 4 already exists"
        );
    }
}
