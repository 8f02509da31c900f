// region:    --- Imports
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::{debug, warn};

use crate::auction::events::LiveEvent;

// endregion: --- Imports

// region:    --- Broadcaster

/// Fan-out registry pushing accepted-bid events to live subscribers.
///
/// Subscriptions are keyed by product (or open to all products).
/// `publish` holds the registry lock for the whole delivery pass, which
/// gives every subscriber the same global event order; per-subscriber
/// channels then preserve that order to each connection. Delivery is
/// at-most-once and best-effort: a subscriber whose channel has closed is
/// pruned on the spot and receives nothing further.
pub struct Broadcaster {
    registry: StdMutex<Registry>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Entry>,
}

struct Entry {
    id: u64,
    product_id: Option<String>,
    tx: mpsc::UnboundedSender<LiveEvent>,
}

impl Entry {
    fn wants(&self, event: &LiveEvent) -> bool {
        match (&self.product_id, event.product_id()) {
            (Some(subscribed), Some(concerned)) => subscribed == concerned,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

impl Broadcaster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            registry: StdMutex::new(Registry::default()),
        })
    }

    /// Register a subscriber, optionally filtered to one product. The
    /// acknowledgment frame is queued before this returns, so it precedes
    /// every event the subscriber will ever receive.
    pub fn subscribe(self: &Arc<Self>, product_id: Option<String>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut registry = self.registry.lock().expect("subscriber registry poisoned");
            let id = registry.next_id;
            registry.next_id += 1;
            registry.subscribers.push(Entry {
                id,
                product_id,
                tx: tx.clone(),
            });
            id
        };
        debug!("{:<12} --> subscriber {} registered", "Broadcast", id);

        let subscription = Subscription {
            id,
            tx,
            rx,
            broadcaster: Arc::clone(self),
        };
        subscription.push(LiveEvent::Connected);
        subscription
    }

    /// Deliver `event` to every registered subscriber interested in it,
    /// in the order `publish` was called. Broken channels are pruned and
    /// never affect other subscribers or the publisher.
    pub fn publish(&self, event: &LiveEvent) {
        let mut registry = self.registry.lock().expect("subscriber registry poisoned");
        registry.subscribers.retain(|entry| {
            if !entry.wants(event) {
                return true;
            }
            match entry.tx.send(event.clone()) {
                Ok(()) => true,
                Err(_) => {
                    warn!(
                        "{:<12} --> subscriber {} gone, pruning",
                        "Broadcast", entry.id
                    );
                    false
                }
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .expect("subscriber registry poisoned")
            .subscribers
            .len()
    }

    fn unsubscribe(&self, id: u64) {
        let mut registry = self.registry.lock().expect("subscriber registry poisoned");
        registry.subscribers.retain(|entry| entry.id != id);
        debug!("{:<12} --> subscriber {} deregistered", "Broadcast", id);
    }
}

// endregion: --- Broadcaster

// region:    --- Subscription

/// A live subscriber handle. Dropping it deregisters the subscriber, so
/// a closed transport cleans itself up without a callback.
pub struct Subscription {
    id: u64,
    tx: mpsc::UnboundedSender<LiveEvent>,
    rx: mpsc::UnboundedReceiver<LiveEvent>,
    broadcaster: Arc<Broadcaster>,
}

impl Subscription {
    /// Queue an event for this subscriber only, e.g. the initial auction
    /// snapshot on connect.
    pub fn push(&self, event: LiveEvent) {
        // Cannot fail while we hold both ends.
        let _ = self.tx.send(event);
    }

    pub async fn recv(&mut self) -> Option<LiveEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<LiveEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = LiveEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(self.id);
    }
}

// endregion: --- Subscription

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::model::Bid;
    use chrono::Utc;

    fn bid(user: &str, amount: f64) -> Bid {
        Bid {
            user_id: user.into(),
            username: user.to_uppercase(),
            amount,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ack_frame_precedes_all_events() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe(None);
        broadcaster.publish(&LiveEvent::new_bid("p1", &bid("u1", 100.0)));

        assert_eq!(sub.recv().await, Some(LiveEvent::Connected));
        assert!(matches!(sub.recv().await, Some(LiveEvent::NewBid { .. })));
    }

    #[tokio::test]
    async fn subscriber_receives_each_published_event_once() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe(None);
        assert_eq!(sub.recv().await, Some(LiveEvent::Connected));

        let event = LiveEvent::new_bid("p1", &bid("u1", 100.0));
        broadcaster.publish(&event);

        assert_eq!(sub.recv().await, Some(event));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn delivery_matches_publish_order() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe(None);
        assert_eq!(sub.recv().await, Some(LiveEvent::Connected));

        for amount in [100.0, 110.0, 120.0] {
            broadcaster.publish(&LiveEvent::new_bid("p1", &bid("u1", amount)));
        }
        for expected in [100.0, 110.0, 120.0] {
            match sub.recv().await {
                Some(LiveEvent::NewBid { amount, .. }) => assert_eq!(amount, expected),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn dropped_subscription_receives_nothing_further() {
        let broadcaster = Broadcaster::new();
        let sub = broadcaster.subscribe(None);
        assert_eq!(broadcaster.subscriber_count(), 1);

        drop(sub);
        assert_eq!(broadcaster.subscriber_count(), 0);

        // Publishing after the drop must not panic or resurrect anything.
        broadcaster.publish(&LiveEvent::new_bid("p1", &bid("u1", 100.0)));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn product_filter_drops_foreign_events() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe(Some("p1".into()));
        assert_eq!(sub.recv().await, Some(LiveEvent::Connected));

        broadcaster.publish(&LiveEvent::new_bid("p2", &bid("u1", 100.0)));
        let mine = LiveEvent::new_bid("p1", &bid("u2", 200.0));
        broadcaster.publish(&mine);

        assert_eq!(sub.recv().await, Some(mine));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn closed_channel_is_pruned_without_failing_others() {
        let broadcaster = Broadcaster::new();
        let mut healthy = broadcaster.subscribe(None);
        let mut dead = broadcaster.subscribe(None);
        assert_eq!(healthy.recv().await, Some(LiveEvent::Connected));
        assert_eq!(dead.recv().await, Some(LiveEvent::Connected));

        // Simulate a vanished transport: close the receiving side while
        // the registry entry is still present.
        dead.rx.close();

        let event = LiveEvent::new_bid("p1", &bid("u1", 100.0));
        broadcaster.publish(&event);

        assert_eq!(healthy.recv().await, Some(event));
        assert_eq!(broadcaster.subscriber_count(), 1);
    }
}
