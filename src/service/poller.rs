//! Periodic broadcast of collection samples.
//!
//! On every tick the poller enumerates the store's collections and, for
//! each one independently, publishes a [`BusEvent::RealTimeData`] holding
//! the first few documents. A failing collection is logged and skipped;
//! the rest of the tick and later ticks are unaffected.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use super::CollectionGateway;
use crate::domain::{BusEvent, EventBus};

/// Samples every collection on a fixed interval and publishes the
/// samples on the [`EventBus`].
#[derive(Debug, Clone)]
pub struct BroadcastPoller {
    gateway: Arc<CollectionGateway>,
    event_bus: EventBus,
    interval: Duration,
    sample_size: usize,
}

impl BroadcastPoller {
    /// Creates a poller. `interval` must be non-zero.
    #[must_use]
    pub fn new(
        gateway: Arc<CollectionGateway>,
        event_bus: EventBus,
        interval: Duration,
        sample_size: usize,
    ) -> Self {
        Self {
            gateway,
            event_bus,
            interval: interval.max(Duration::from_millis(1)),
            sample_size,
        }
    }

    /// Starts the tick loop on the runtime and returns its handle.
    ///
    /// The first tick fires one full interval after the call. Each tick's
    /// cycle runs as its own task, so a slow cycle never delays the next
    /// tick. Aborting the returned handle also aborts every cycle still in
    /// flight.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        tracing::info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            sample_size = self.sample_size,
            "broadcast poller started"
        );
        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Owned by this task, so cancelling the loop drops and aborts them.
        let mut cycles = JoinSet::new();
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let poller = self.clone();
                    cycles.spawn(async move { poller.poll_cycle().await });
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "poll cycle aborted");
                    }
                }
            }
        }
    }

    /// Runs one cycle: samples every collection and publishes one event
    /// per collection that was read successfully.
    ///
    /// Returns the number of events published.
    pub async fn poll_cycle(&self) -> usize {
        let names = match self.gateway.list_collections().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "poll cycle skipped: cannot list collections");
                return 0;
            }
        };

        let mut tasks = JoinSet::new();
        for name in names {
            let gateway = Arc::clone(&self.gateway);
            let event_bus = self.event_bus.clone();
            let sample_size = self.sample_size;
            tasks.spawn(async move {
                match gateway.sample(&name, sample_size).await {
                    Ok(data) => {
                        let receivers = event_bus.publish(BusEvent::RealTimeData {
                            collection: name.clone(),
                            data,
                        });
                        tracing::debug!(collection = %name, receivers, "sample published");
                        true
                    }
                    Err(e) => {
                        tracing::warn!(collection = %name, error = %e, "sample failed");
                        false
                    }
                }
            });
        }

        let mut published = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => published += 1,
                Ok(false) => {}
                Err(e) => tracing::error!(error = %e, "sample task aborted"),
            }
        }
        published
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Document, DocumentId};
    use crate::error::GatewayError;
    use crate::persistence::AuditLog;
    use crate::store::{DocumentStore, FindFilter, MemoryStore};
    use async_trait::async_trait;
    use serde_json::json;

    /// Memory store where one collection can fail or stall on every read.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        broken: Option<String>,
        slow: Option<(String, Duration)>,
        listing_fails: bool,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn list_collection_names(&self) -> Result<Vec<String>, GatewayError> {
            if self.listing_fails {
                return Err(GatewayError::StoreUnavailable("listing down".to_string()));
            }
            self.inner.list_collection_names().await
        }

        async fn find(
            &self,
            collection: &str,
            filter: FindFilter<'_>,
        ) -> Result<Vec<Document>, GatewayError> {
            if self.broken.as_deref() == Some(collection) {
                return Err(GatewayError::StoreUnavailable(format!("{collection} down")));
            }
            if let Some((slow, delay)) = &self.slow
                && slow == collection
            {
                tokio::time::sleep(*delay).await;
            }
            self.inner.find(collection, filter).await
        }

        async fn insert(
            &self,
            collection: &str,
            body: Document,
        ) -> Result<DocumentId, GatewayError> {
            self.inner.insert(collection, body).await
        }

        async fn update(
            &self,
            collection: &str,
            id: DocumentId,
            partial: &Document,
        ) -> Result<bool, GatewayError> {
            self.inner.update(collection, id, partial).await
        }

        async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool, GatewayError> {
            self.inner.delete(collection, id).await
        }

        async fn count(&self, collection: &str) -> Result<u64, GatewayError> {
            self.inner.count(collection).await
        }
    }

    async fn seed(store: &impl DocumentStore, collection: &str, n: usize) {
        for i in 0..n {
            let mut doc = Document::new();
            doc.insert("n".to_string(), json!(i));
            let _ = store.insert(collection, doc).await;
        }
    }

    fn make_poller(
        store: Arc<dyn DocumentStore>,
        dir: &tempfile::TempDir,
    ) -> (BroadcastPoller, EventBus) {
        let gateway = Arc::new(CollectionGateway::new(
            store,
            Arc::new(AuditLog::in_folder(dir.path())),
        ));
        let bus = EventBus::new(64);
        let poller =
            BroadcastPoller::new(gateway, bus.clone(), Duration::from_millis(20), 10);
        (poller, bus)
    }

    fn drain(subscription: &mut crate::domain::Subscription) -> Vec<BusEvent> {
        let mut events = Vec::new();
        while let Ok(event) = subscription.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn cycle_publishes_one_sample_per_collection() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = FlakyStore::default();
        seed(&store, "orders", 12).await;
        seed(&store, "users", 3).await;
        let (poller, bus) = make_poller(Arc::new(store), &dir);
        let mut sub = bus.subscribe();

        assert_eq!(poller.poll_cycle().await, 2);

        let mut events = drain(&mut sub);
        events.sort_by(|a, b| a.collection().cmp(b.collection()));
        let sizes: Vec<(String, usize)> = events
            .iter()
            .map(|e| match e {
                BusEvent::RealTimeData { collection, data } => (collection.clone(), data.len()),
                BusEvent::Alert { .. } => panic!("unexpected alert"),
            })
            .collect();
        assert_eq!(
            sizes,
            vec![("orders".to_string(), 10), ("users".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn failing_collection_does_not_stop_the_others() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = FlakyStore {
            broken: Some("orders".to_string()),
            ..FlakyStore::default()
        };
        seed(&store, "orders", 2).await;
        seed(&store, "users", 2).await;
        let (poller, bus) = make_poller(Arc::new(store), &dir);
        let mut sub = bus.subscribe();

        assert_eq!(poller.poll_cycle().await, 1);
        let events = drain(&mut sub);
        assert_eq!(events.len(), 1);
        assert_eq!(events.first().map(BusEvent::collection), Some("users"));
    }

    #[tokio::test]
    async fn listing_failure_publishes_nothing() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = FlakyStore {
            listing_fails: true,
            ..FlakyStore::default()
        };
        seed(&store, "orders", 2).await;
        let (poller, bus) = make_poller(Arc::new(store), &dir);
        let mut sub = bus.subscribe();

        assert_eq!(poller.poll_cycle().await, 0);
        assert!(drain(&mut sub).is_empty());
    }

    #[tokio::test]
    async fn collection_set_is_reread_every_cycle() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = Arc::new(MemoryStore::new());
        seed(store.as_ref(), "orders", 1).await;
        let (poller, _bus) = make_poller(Arc::clone(&store) as Arc<dyn DocumentStore>, &dir);

        assert_eq!(poller.poll_cycle().await, 1);
        seed(store.as_ref(), "users", 1).await;
        assert_eq!(poller.poll_cycle().await, 2);
        let _ = store.drop_collection("orders").await;
        assert_eq!(poller.poll_cycle().await, 1);
    }

    #[tokio::test]
    async fn sampling_is_not_audited() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = FlakyStore::default();
        seed(&store, "orders", 2).await;
        let (poller, _bus) = make_poller(Arc::new(store), &dir);
        let _ = poller.poll_cycle().await;

        let log = AuditLog::in_folder(dir.path());
        assert!(matches!(log.query("orders", None).await, Ok(ref e) if e.is_empty()));
    }

    #[tokio::test]
    async fn spawned_loop_keeps_publishing() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = FlakyStore::default();
        seed(&store, "orders", 1).await;
        let (poller, bus) = make_poller(Arc::new(store), &dir);
        let mut sub = bus.subscribe();
        let handle = poller.spawn();

        for _ in 0..2 {
            let received = tokio::time::timeout(Duration::from_secs(2), sub.recv()).await;
            assert!(matches!(received, Ok(Ok(BusEvent::RealTimeData { .. }))));
        }
        handle.abort();
    }

    #[tokio::test]
    async fn slow_collection_does_not_delay_the_others() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = FlakyStore {
            slow: Some(("orders".to_string(), Duration::from_secs(3))),
            ..FlakyStore::default()
        };
        seed(&store, "orders", 1).await;
        seed(&store, "users", 1).await;
        let (poller, bus) = make_poller(Arc::new(store), &dir);
        let mut sub = bus.subscribe();
        let handle = poller.spawn();

        let deadline = tokio::time::Instant::now() + Duration::from_millis(500);
        let mut users = 0;
        let mut orders = 0;
        while let Ok(Ok(event)) = tokio::time::timeout_at(deadline, sub.recv()).await {
            match event.collection() {
                "users" => users += 1,
                "orders" => orders += 1,
                other => panic!("unexpected collection {other}"),
            }
        }
        handle.abort();

        assert!(users >= 3, "only {users} users samples while orders stalled");
        assert_eq!(orders, 0);
    }

    #[tokio::test]
    async fn aborting_the_loop_stops_cycles_in_flight() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = FlakyStore {
            slow: Some(("orders".to_string(), Duration::from_millis(300))),
            ..FlakyStore::default()
        };
        seed(&store, "orders", 1).await;
        let (poller, bus) = make_poller(Arc::new(store), &dir);
        let mut sub = bus.subscribe();
        let handle = poller.spawn();

        // several cycles are now stalled on `orders`
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();
        assert!(matches!(handle.await, Err(ref e) if e.is_cancelled()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = drain(&mut sub);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(drain(&mut sub).is_empty());
    }
}
