//! Event bus boundary: where committed events leave the core.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::DomainError;
use crate::repository::StoredEvent;

/// Receives each newly committed event, once, in version order per aggregate.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish one committed event.
    async fn publish(&self, event: &StoredEvent) -> Result<(), DomainError>;
}

/// A bus that accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventBus;

#[async_trait]
impl EventBus for NoopEventBus {
    async fn publish(&self, _event: &StoredEvent) -> Result<(), DomainError> {
        Ok(())
    }
}

/// In-process fan-out over a tokio broadcast channel.
///
/// Publishing with no subscribers succeeds. Subscribers that fall more than
/// `capacity` events behind observe `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<StoredEvent>,
}

impl BroadcastEventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Registers a new subscriber that sees events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoredEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventBus for BroadcastEventBus {
    async fn publish(&self, event: &StoredEvent) -> Result<(), DomainError> {
        // A send error only means nobody is listening.
        let receivers = self.sender.send(event.clone()).unwrap_or(0);
        trace!(event_id = %event.event_id, receivers, "broadcast event");
        Ok(())
    }
}
