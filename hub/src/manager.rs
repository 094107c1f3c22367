use crate::connection::{
    CloseSignal, ConnectionId, ConnectionRegistry, Enqueue, OutboundReceiver, UserId,
};
use crate::error::Result;
use crate::message::{BroadcastEvent, EventType, Message as HubMessage, Topic};
use log::*;
use std::sync::Arc;

/// Default outbound queue depth per connection.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Outcome of one dispatch, for logging by producers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub evicted: usize,
}

/// Front door for connection handlers and producers. Owns the registry and
/// fans events out to topic members.
pub struct Hub {
    registry: Arc<ConnectionRegistry>,
}

impl Hub {
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new(outbound_capacity)),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Register a new connection and return its unique ID and outbound queue
    pub fn register_connection(
        &self,
        user_id: UserId,
        topics: impl IntoIterator<Item = Topic>,
    ) -> Result<(ConnectionId, OutboundReceiver)> {
        let (connection_id, receiver) = self.registry.register(user_id.clone(), topics)?;
        info!(
            "Registered connection {} for user {user_id}",
            connection_id.as_str()
        );
        Ok((connection_id, receiver))
    }

    /// Add a topic to an already registered connection
    pub fn join_topic(&self, connection_id: &ConnectionId, topic: Topic) -> bool {
        let joined = self.registry.subscribe(connection_id, topic.clone());
        if joined {
            debug!("Connection {} joined {topic}", connection_id.as_str());
        }
        joined
    }

    /// Unregister a connection by ID. Safe to call any number of times.
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        if self.registry.unregister(connection_id) {
            info!("Unregistered connection {}", connection_id.as_str());
        } else {
            trace!(
                "Connection {} already unregistered",
                connection_id.as_str()
            );
        }
    }

    /// Signal that fires when the connection's outbound queue is closed.
    pub fn watch_close(&self, connection_id: &ConnectionId) -> Option<CloseSignal> {
        self.registry.watch_close(connection_id)
    }

    /// Number of live connections subscribed to `topic`.
    pub fn active_count(&self, topic: &Topic) -> usize {
        self.registry.active_count(topic)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Deliver one payload to every current member of its topic without waiting.
    ///
    /// A member whose queue is full, or whose writer has gone away, is evicted
    /// through the same path as `unregister_connection`. Unknown topics are a no-op.
    pub fn dispatch(&self, event: BroadcastEvent) -> DispatchReport {
        let BroadcastEvent { topic, payload } = event;
        let mut report = DispatchReport::default();
        let mut stalled = Vec::new();

        for connection_id in self.registry.members(&topic) {
            match self.registry.try_enqueue(&connection_id, payload.clone()) {
                Enqueue::Delivered => report.delivered += 1,
                Enqueue::Saturated => {
                    warn!(
                        "Outbound queue full for connection {} on {topic}. Evicting.",
                        connection_id.as_str()
                    );
                    stalled.push(connection_id);
                }
                Enqueue::Disconnected => {
                    debug!(
                        "Writer gone for connection {} on {topic}. Evicting.",
                        connection_id.as_str()
                    );
                    stalled.push(connection_id);
                }
                Enqueue::Missing => {}
            }
        }

        for connection_id in &stalled {
            if self.registry.unregister(connection_id) {
                report.evicted += 1;
            }
        }

        trace!(
            "Dispatched to {topic}: delivered={} evicted={}",
            report.delivered,
            report.evicted
        );
        report
    }

    /// Serialize a typed message and dispatch it to its topic
    pub fn send_message(&self, message: HubMessage) -> DispatchReport {
        let event_type = message.event.event_type();

        match message.into_broadcast() {
            Ok(broadcast) => self.dispatch(broadcast),
            Err(e) => {
                error!("Failed to serialize {event_type} event: {e}");
                DispatchReport::default()
            }
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Event;
    use axum::body::Bytes;
    use std::time::Duration;
    use tokio::sync::mpsc::error::TryRecvError;

    fn room() -> Topic {
        Topic::scene("room-1")
    }

    #[tokio::test]
    async fn test_dispatch_to_unknown_topic_is_noop() {
        let hub = Hub::new(4);
        let report = hub.dispatch(BroadcastEvent::new(Topic::scene("empty"), "hello"));
        assert_eq!(report, DispatchReport::default());
        assert_eq!(hub.registry().topic_count(), 0);
    }

    #[tokio::test]
    async fn test_two_subscribers_then_one() {
        let hub = Hub::new(4);
        let (c1, mut rx1) = hub.register_connection("u1".to_string(), [room()]).unwrap();
        let (_c2, mut rx2) = hub.register_connection("u2".to_string(), [room()]).unwrap();

        let report = hub.dispatch(BroadcastEvent::new(room(), "payload"));
        assert_eq!(report.delivered, 2);
        assert_eq!(rx1.recv().await.unwrap(), Bytes::from_static(b"payload"));
        assert_eq!(rx2.recv().await.unwrap(), Bytes::from_static(b"payload"));
        assert_eq!(hub.active_count(&room()), 2);

        hub.unregister_connection(&c1);
        assert_eq!(hub.active_count(&room()), 1);

        hub.dispatch(BroadcastEvent::new(room(), "again"));
        assert_eq!(rx2.recv().await.unwrap(), Bytes::from_static(b"again"));
        assert_eq!(rx1.recv().await, None);
    }

    #[tokio::test]
    async fn test_saturated_subscriber_is_evicted_without_blocking() {
        let hub = Hub::new(2);
        let (c1, mut rx1) = hub.register_connection("u1".to_string(), [room()]).unwrap();
        let (c2, mut rx2) = hub.register_connection("u2".to_string(), [room()]).unwrap();

        hub.dispatch(BroadcastEvent::new(room(), "a"));
        hub.dispatch(BroadcastEvent::new(room(), "b"));
        // c2 keeps up, c1 never drains.
        assert_eq!(rx2.recv().await.unwrap(), Bytes::from_static(b"a"));
        assert_eq!(rx2.recv().await.unwrap(), Bytes::from_static(b"b"));

        let report = tokio::time::timeout(
            Duration::from_secs(1),
            async { hub.dispatch(BroadcastEvent::new(room(), "c")) },
        )
        .await
        .expect("dispatch must not block on a full queue");

        assert_eq!(report, DispatchReport { delivered: 1, evicted: 1 });
        assert!(!hub.registry().is_member(&room(), &c1));
        assert!(hub.registry().is_member(&room(), &c2));

        // The evicted queue is closed but still drains what it already held.
        assert_eq!(rx1.recv().await.unwrap(), Bytes::from_static(b"a"));
        assert_eq!(rx1.recv().await.unwrap(), Bytes::from_static(b"b"));
        assert_eq!(rx1.recv().await, None);
        assert_eq!(rx2.recv().await.unwrap(), Bytes::from_static(b"c"));
    }

    #[tokio::test]
    async fn test_subscriber_with_dropped_writer_is_evicted() {
        let hub = Hub::new(4);
        let (c1, rx1) = hub.register_connection("u1".to_string(), [room()]).unwrap();
        drop(rx1);

        let report = hub.dispatch(BroadcastEvent::new(room(), "x"));
        assert_eq!(report, DispatchReport { delivered: 0, evicted: 1 });
        assert!(!hub.registry().is_registered(&c1));
        assert_eq!(hub.registry().topic_count(), 0);
    }

    #[tokio::test]
    async fn test_sequential_dispatch_preserves_order() {
        let hub = Hub::new(16);
        let (_c1, mut rx1) = hub.register_connection("u1".to_string(), [room()]).unwrap();
        let (_c2, mut rx2) = hub.register_connection("u2".to_string(), [room()]).unwrap();

        for i in 0..10 {
            hub.dispatch(BroadcastEvent::new(room(), format!("m{i}").into_bytes()));
        }

        for rx in [&mut rx1, &mut rx2] {
            for i in 0..10 {
                let expected = Bytes::from(format!("m{i}").into_bytes());
                assert_eq!(rx.recv().await.unwrap(), expected);
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_is_scoped_to_topic() {
        let hub = Hub::new(4);
        let dm = Topic::conversation("dm-1");
        let (_c1, mut rx1) = hub.register_connection("u1".to_string(), [dm.clone()]).unwrap();
        let (_c2, mut rx2) = hub.register_connection("u2".to_string(), [room()]).unwrap();

        hub.dispatch(BroadcastEvent::new(dm, "private"));
        assert_eq!(rx1.recv().await.unwrap(), Bytes::from_static(b"private"));
        assert_eq!(rx2.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_join_topic_after_register() {
        let hub = Hub::new(4);
        let (c1, mut rx1) = hub
            .register_connection("u1".to_string(), Vec::<Topic>::new())
            .unwrap();

        assert!(hub.join_topic(&c1, room()));
        hub.dispatch(BroadcastEvent::new(room(), "welcome"));
        assert_eq!(rx1.recv().await.unwrap(), Bytes::from_static(b"welcome"));
    }

    #[tokio::test]
    async fn test_double_unregister_is_harmless() {
        let hub = Hub::new(4);
        let (c1, mut rx1) = hub.register_connection("u1".to_string(), [room()]).unwrap();

        hub.unregister_connection(&c1);
        hub.unregister_connection(&c1);
        assert_eq!(rx1.recv().await, None);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_send_message_serializes_event() {
        let hub = Hub::new(4);
        let (_c1, mut rx1) = hub.register_connection("u1".to_string(), [room()]).unwrap();

        let report = hub.send_message(HubMessage {
            event: Event::SceneUserJoined {
                scene_id: "room-1".to_string(),
                user_id: "u9".to_string(),
                active_users: 1,
            },
            topic: room(),
        });
        assert_eq!(report.delivered, 1);

        let payload = rx1.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["type"], "scene_user_joined");
        assert_eq!(value["data"]["user_id"], "u9");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_and_churn() {
        let hub = Arc::new(Hub::new(1024));
        let (_stable, mut stable_rx) = hub.register_connection("stable".to_string(), [room()]).unwrap();

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let hub = Arc::clone(&hub);
                tokio::spawn(async move {
                    for i in 0..50 {
                        hub.dispatch(BroadcastEvent::new(room(), format!("{p}:{i}").into_bytes()));
                    }
                })
            })
            .collect();
        let churn = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                for i in 0..50 {
                    let (id, _rx) = hub.register_connection(format!("c{i}"), [room()]).unwrap();
                    hub.unregister_connection(&id);
                }
            })
        };

        for handle in producers {
            handle.await.unwrap();
        }
        churn.await.unwrap();

        // Per producer, the stable subscriber sees messages in dispatch order.
        let mut last_seen = [-1i32; 4];
        let mut total = 0;
        while let Ok(payload) = stable_rx.try_recv() {
            let text = String::from_utf8(payload.to_vec()).unwrap();
            let (p, i) = text.split_once(':').unwrap();
            let (p, i): (usize, i32) = (p.parse().unwrap(), i.parse().unwrap());
            assert!(i > last_seen[p]);
            last_seen[p] = i;
            total += 1;
        }
        assert_eq!(total, 200);
        assert_eq!(hub.active_count(&room()), 1);
    }
}
