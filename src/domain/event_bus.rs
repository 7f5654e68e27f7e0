//! Broadcast channel fanning collection updates and alerts out to
//! subscribers.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The poller
//! publishes a [`BusEvent::RealTimeData`] per collection per tick and the
//! alert endpoint publishes [`BusEvent::Alert`]; every WebSocket connection
//! holds one [`Subscription`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::BusEvent;

/// Handle identifying one registered subscriber.
pub type SubscriberId = u64;

/// Broadcast bus for [`BusEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// Each subscriber owns an independent cursor into the ring buffer, so a
/// slow or disconnected subscriber never delays delivery to the others;
/// once it falls more than `capacity` events behind it skips the oldest
/// ones. Publishing never waits for consumers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
    next_id: Arc<AtomicU64>,
}

/// A registered subscriber: its handle plus its receiving end.
///
/// Only events published after [`EventBus::subscribe`] returned are
/// delivered. Dropping the subscription (or passing it to
/// [`EventBus::unsubscribe`]) deregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: broadcast::Receiver<BusEvent>,
}

impl Subscription {
    /// Returns this subscriber's handle.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`broadcast::error::RecvError::Lagged`] when events were
    /// skipped because this subscriber fell behind, and
    /// [`broadcast::error::RecvError::Closed`] once the bus is gone.
    pub async fn recv(&mut self) -> Result<BusEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Returns the next already-delivered event without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`broadcast::error::TryRecvError::Empty`] when nothing is
    /// pending, plus the lag/closed cases of [`Self::recv`].
    pub fn try_recv(&mut self) -> Result<BusEvent, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Returns the number of subscribers the event was queued for.
    /// If there are none, the event is silently dropped.
    pub fn publish(&self, event: BusEvent) -> usize {
        let topic = event.topic();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(topic, delivered, "bus event published");
        delivered
    }

    /// Registers a new subscriber that receives all future events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(subscriber = id, "subscriber registered");
        Subscription {
            id,
            receiver: self.sender.subscribe(),
        }
    }

    /// Deregisters a subscriber. Events already queued for it are discarded.
    pub fn unsubscribe(&self, subscription: Subscription) {
        tracing::debug!(subscriber = subscription.id, "subscriber removed");
        drop(subscription);
    }

    /// Returns the current number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
