//! Event codec: an explicit registry from stable type tags to payload shapes.
//!
//! Tags are chosen by the domain when the codec is wired at startup and are
//! never derived from Rust type names, so renaming a payload struct does not
//! orphan the events already in storage.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::DomainError;
use crate::event::{Event, EventKind, EventMetadata};
use crate::repository::StoredEvent;

type Decoder<K> = Box<dyn Fn(&str) -> Result<K, serde_json::Error> + Send + Sync>;

/// Serializes events of one aggregate kind to `(type tag, JSON payload)` and back.
pub struct EventCodec<K> {
    decoders: HashMap<&'static str, Decoder<K>>,
}

impl<K: EventKind> EventCodec<K> {
    /// Creates an empty codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Maps `event_type` to the payload struct `T`.
    ///
    /// `event_type` must be the tag that [`EventKind::event_type`] reports for
    /// the variant `T` converts into. A mismatched registration is not caught
    /// here; `decode` rejects any payload whose decoded variant reports a
    /// different tag than the one it was stored under.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateEventType` if the tag is already taken.
    pub fn register<T>(mut self, event_type: &'static str) -> Result<Self, DomainError>
    where
        T: DeserializeOwned + Into<K> + 'static,
    {
        if self.decoders.contains_key(event_type) {
            return Err(DomainError::DuplicateEventType(event_type.to_owned()));
        }
        self.decoders.insert(
            event_type,
            Box::new(|data: &str| serde_json::from_str::<T>(data).map(Into::into)),
        );
        Ok(self)
    }

    /// Returns the registered tags in sorted order.
    #[must_use]
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.decoders.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Encodes an event variant into its tag and payload text.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownEventType` if the variant's tag was never
    /// registered, or `DomainError::MalformedPayload` if serialization fails.
    pub fn encode(&self, kind: &K) -> Result<(String, String), DomainError> {
        let event_type = kind.event_type();
        if !self.decoders.contains_key(event_type) {
            return Err(DomainError::UnknownEventType(event_type.to_owned()));
        }
        let data = kind
            .to_data()
            .and_then(|value| serde_json::to_string(&value))
            .map_err(|e| DomainError::MalformedPayload {
                event_type: event_type.to_owned(),
                reason: e.to_string(),
            })?;
        Ok((event_type.to_owned(), data))
    }

    /// Decodes payload text using the shape registered for `event_type`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownEventType` for unregistered tags and
    /// `DomainError::MalformedPayload` when the payload does not parse or
    /// decodes into a variant registered under another tag.
    pub fn decode(&self, event_type: &str, data: &str) -> Result<K, DomainError> {
        let decoder = self
            .decoders
            .get(event_type)
            .ok_or_else(|| DomainError::UnknownEventType(event_type.to_owned()))?;
        let kind = decoder(data).map_err(|e| DomainError::MalformedPayload {
            event_type: event_type.to_owned(),
            reason: e.to_string(),
        })?;
        if kind.event_type() != event_type {
            return Err(DomainError::MalformedPayload {
                event_type: event_type.to_owned(),
                reason: format!("payload decodes as {}", kind.event_type()),
            });
        }
        Ok(kind)
    }

    /// Converts a domain event into its stored record. `storage_seq` is left
    /// for the backend to assign.
    ///
    /// # Errors
    ///
    /// Propagates `encode` failures.
    pub fn to_stored(&self, event: &Event<K>) -> Result<StoredEvent, DomainError> {
        let (event_type, event_data) = self.encode(&event.kind)?;
        let meta = &event.metadata;
        Ok(StoredEvent {
            storage_seq: None,
            event_id: meta.event_id,
            actor_id: meta.actor_id.clone(),
            occurred_on: meta.occurred_on,
            version: meta.version,
            delete_action: meta.delete_action,
            aggregate_type: meta.aggregate_type.clone(),
            aggregate_id: meta.aggregate_id.clone(),
            event_type,
            event_data,
        })
    }

    /// Rebuilds a domain event from its stored record.
    ///
    /// # Errors
    ///
    /// Propagates `decode` failures.
    pub fn from_stored(&self, stored: &StoredEvent) -> Result<Event<K>, DomainError> {
        let kind = self.decode(&stored.event_type, &stored.event_data)?;
        Ok(Event {
            metadata: EventMetadata {
                event_id: stored.event_id,
                aggregate_id: stored.aggregate_id.clone(),
                aggregate_type: stored.aggregate_type.clone(),
                version: stored.version,
                actor_id: stored.actor_id.clone(),
                occurred_on: stored.occurred_on,
                delete_action: stored.delete_action,
            },
            kind,
        })
    }
}

impl<K: EventKind> Default for EventCodec<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for EventCodec<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.decoders.keys().collect();
        types.sort_unstable();
        f.debug_struct("EventCodec")
            .field("event_types", &types)
            .finish()
    }
}
