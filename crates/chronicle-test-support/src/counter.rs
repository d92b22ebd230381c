//! A small sample aggregate for exercising repositories and backends.

use chrono::{DateTime, Utc};
use chronicle_core::aggregate::{AggregateRoot, EventHistory};
use chronicle_core::codec::EventCodec;
use chronicle_core::error::DomainError;
use chronicle_core::event::{AggregateId, EventKind, PendingEvent};
use serde::{Deserialize, Serialize};

use crate::clock::fixed_time;

/// Payload of `counter.incremented`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incremented {
    /// Amount added.
    pub by: i64,
}

/// Payload of `counter.retired`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retired {}

/// Payload of `counter.revived`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revived {}

/// Every event a [`Counter`] can raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
    /// The value grew.
    Incremented(Incremented),
    /// The counter was soft-deleted.
    Retired(Retired),
    /// The counter was restored.
    Revived(Revived),
}

impl From<Incremented> for CounterEvent {
    fn from(value: Incremented) -> Self {
        Self::Incremented(value)
    }
}

impl From<Retired> for CounterEvent {
    fn from(value: Retired) -> Self {
        Self::Retired(value)
    }
}

impl From<Revived> for CounterEvent {
    fn from(value: Revived) -> Self {
        Self::Revived(value)
    }
}

impl EventKind for CounterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Incremented(_) => "counter.incremented",
            Self::Retired(_) => "counter.retired",
            Self::Revived(_) => "counter.revived",
        }
    }

    fn to_data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Incremented(payload) => serde_json::to_value(payload),
            Self::Retired(payload) => serde_json::to_value(payload),
            Self::Revived(payload) => serde_json::to_value(payload),
        }
    }
}

/// A counter that can be incremented, retired and revived.
#[derive(Debug)]
pub struct Counter {
    /// Running total.
    pub value: i64,
    history: EventHistory<CounterEvent>,
}

impl Counter {
    /// A fresh counter with no history.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self::empty(AggregateId::new(id))
    }

    /// Adds `by`; returns the new version.
    pub fn increment(&mut self, by: i64) -> i64 {
        self.raise(PendingEvent::new(Incremented { by }.into(), now()))
    }

    /// Soft-deletes the counter.
    pub fn retire(&mut self) -> i64 {
        self.raise(PendingEvent::new(Retired {}.into(), now()).deleting())
    }

    /// Restores a retired counter.
    pub fn revive(&mut self) -> i64 {
        self.raise(PendingEvent::new(Revived {}.into(), now()).undeleting())
    }
}

impl AggregateRoot for Counter {
    type Event = CounterEvent;
    const AGGREGATE_TYPE: &'static str = "counter";

    fn empty(id: AggregateId) -> Self {
        Self {
            value: 0,
            history: EventHistory::new(id),
        }
    }

    fn history(&self) -> &EventHistory<CounterEvent> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut EventHistory<CounterEvent> {
        &mut self.history
    }

    fn apply(&mut self, event: &CounterEvent) {
        if let CounterEvent::Incremented(payload) = event {
            self.value += payload.by;
        }
    }
}

fn now() -> DateTime<Utc> {
    fixed_time()
}

/// Codec with every [`CounterEvent`] registered.
///
/// # Errors
///
/// Never fails in practice; registration only fails on duplicate tags.
pub fn counter_codec() -> Result<EventCodec<CounterEvent>, DomainError> {
    EventCodec::new()
        .register::<Incremented>("counter.incremented")?
        .register::<Retired>("counter.retired")?
        .register::<Revived>("counter.revived")
}
