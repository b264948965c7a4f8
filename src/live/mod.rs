//! AdminHub — order-change fan-out to connected admin sessions
//!
//! ```text
//! checkout / webhook / order transitions
//!       │ OrderChanged
//!       ▼
//!   AdminHub (broadcast::Sender)
//!       │
//!       ▼
//! admin WebSocket sessions (subscribe → push)
//! ```
//!
//! Publishing is fire-and-forget: an order mutation must never block or fail
//! because no admin session is connected.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Broadcast channel capacity — enough to buffer connection-time bursts
const BROADCAST_CAPACITY: usize = 256;

/// Event pushed to admin sessions
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminEvent {
    OrderChanged {
        order_id: i64,
        status: String,
        payment_status: String,
        total_amount: f64,
        customer_email: String,
    },
}

/// Broadcast hub for the admin room
#[derive(Clone)]
pub struct AdminHub {
    tx: broadcast::Sender<AdminEvent>,
    connections: Arc<AtomicUsize>,
}

impl Default for AdminHub {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an order-change event to all connected admin sessions
    ///
    /// `send` returns Err when there are no subscribers; safe to ignore.
    pub fn publish(&self, event: AdminEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to the admin room
    pub fn subscribe(&self) -> broadcast::Receiver<AdminEvent> {
        self.tx.subscribe()
    }

    /// Reserve a connection slot; returns false when `max` is reached.
    ///
    /// Atomic increment-then-check avoids the TOCTOU race between concurrent
    /// upgrades.
    pub fn try_connect(&self, max: usize) -> bool {
        let prev = self.connections.fetch_add(1, Ordering::SeqCst);
        if prev >= max {
            self.connections.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Release a connection slot
    pub fn disconnect(&self) {
        self.connections.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_changed(order_id: i64) -> AdminEvent {
        AdminEvent::OrderChanged {
            order_id,
            status: "paid".into(),
            payment_status: "completed".into(),
            total_amount: 35.0,
            customer_email: "buyer@example.com".into(),
        }
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let hub = AdminHub::new();
        hub.publish(order_changed(1));
        hub.publish(order_changed(2));
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let hub = AdminHub::new();
        let mut rx = hub.subscribe();

        hub.publish(order_changed(42));

        match rx.recv().await.unwrap() {
            AdminEvent::OrderChanged {
                order_id, status, ..
            } => {
                assert_eq!(order_id, 42);
                assert_eq!(status, "paid");
            }
        }
    }

    #[tokio::test]
    async fn all_subscribers_receive_each_event() {
        let hub = AdminHub::new();
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        hub.publish(order_changed(7));

        let AdminEvent::OrderChanged { order_id: a, .. } = rx1.recv().await.unwrap();
        let AdminEvent::OrderChanged { order_id: b, .. } = rx2.recv().await.unwrap();
        assert_eq!(a, 7);
        assert_eq!(b, 7);
    }

    #[test]
    fn connection_cap_enforced() {
        let hub = AdminHub::new();
        assert!(hub.try_connect(2));
        assert!(hub.try_connect(2));
        assert!(!hub.try_connect(2));
        assert_eq!(hub.connection_count(), 2);

        hub.disconnect();
        assert!(hub.try_connect(2));
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_string(&order_changed(3)).unwrap();
        assert!(json.contains("\"type\":\"order_changed\""));
        assert!(json.contains("\"order_id\":3"));
    }
}
