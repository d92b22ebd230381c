//! Test buses: mock `EventBus` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chronicle_core::bus::EventBus;
use chronicle_core::error::DomainError;
use chronicle_core::repository::StoredEvent;

/// An event bus that records every published event in order.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    published: Mutex<Vec<StoredEvent>>,
}

impl RecordingEventBus {
    /// Create an empty recording bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every published event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<StoredEvent> {
        self.published.lock().unwrap().clone()
    }

    /// `(aggregate_id, version)` of every published event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published_keys(&self) -> Vec<(String, i64)> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.aggregate_id.to_string(), e.version))
            .collect()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, event: &StoredEvent) -> Result<(), DomainError> {
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// An event bus that rejects the first `failures` publications, then records
/// the rest like [`RecordingEventBus`].
#[derive(Debug)]
pub struct FailingEventBus {
    remaining_failures: AtomicUsize,
    inner: RecordingEventBus,
}

impl FailingEventBus {
    /// A bus that fails `failures` times before recovering.
    #[must_use]
    pub fn new(failures: usize) -> Self {
        Self {
            remaining_failures: AtomicUsize::new(failures),
            inner: RecordingEventBus::new(),
        }
    }

    /// A bus that never accepts anything.
    #[must_use]
    pub fn always() -> Self {
        Self::new(usize::MAX)
    }

    /// Events accepted after the failures ran out.
    pub fn published(&self) -> Vec<StoredEvent> {
        self.inner.published()
    }
}

#[async_trait]
impl EventBus for FailingEventBus {
    async fn publish(&self, event: &StoredEvent) -> Result<(), DomainError> {
        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(DomainError::Publication("broker unavailable".into()));
        }
        self.inner.publish(event).await
    }
}
