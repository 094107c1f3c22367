use crate::error::{Error, Result};
use crate::message::Topic;
use axum::body::Bytes;
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::sync::oneshot;

// Type alias for user IDs (web layer passes them through as plain strings)
pub type UserId = String;

/// Receiving half of a connection's outbound queue, drained by the transport writer.
/// It yields `None` once the registry has closed the queue and every queued payload
/// has been taken.
pub type OutboundReceiver = Receiver<Bytes>;

/// Resolves (with `Err`) the moment the registry closes a connection's outbound
/// queue, even while payloads are still buffered in it.
pub type CloseSignal = oneshot::Receiver<()>;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry-owned state for one live connection. The registry holds the only
/// `Sender`, so dropping this value is what closes the outbound queue.
#[derive(Debug)]
struct Connection {
    user_id: UserId,
    topics: HashSet<Topic>,
    sender: Sender<Bytes>,
    /// Dropped together with `sender`, waking every `CloseSignal`.
    close_watchers: Vec<oneshot::Sender<()>>,
}

/// Result of a non-blocking enqueue onto one connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Delivered,
    /// The queue is at capacity; the peer is treated as stalled.
    Saturated,
    /// The writer dropped its receiver; the transport is gone.
    Disconnected,
    /// The connection was unregistered concurrently.
    Missing,
}

/// Connection registry with two indices: connections by id (ownership) and
/// member sets by topic (routing).
///
/// Lock order is always `connections` before `topics`; no code path holds a
/// `topics` guard while acquiring a `connections` guard.
pub struct ConnectionRegistry {
    /// Primary storage: owns each connection's outbound sender - O(1)
    connections: DashMap<ConnectionId, Connection>,

    /// Secondary index: topic -> member connection ids for dispatch - O(1)
    topics: DashMap<Topic, HashSet<ConnectionId>>,

    outbound_capacity: usize,
}

impl ConnectionRegistry {
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            connections: DashMap::new(),
            topics: DashMap::new(),
            outbound_capacity: outbound_capacity.max(1),
        }
    }

    pub fn outbound_capacity(&self) -> usize {
        self.outbound_capacity
    }

    /// Register a new connection under every non-empty topic it carries.
    ///
    /// Returns the new connection's id together with the receiving half of its
    /// bounded outbound queue. The queue is closed only by `unregister`.
    pub fn register(
        &self,
        user_id: UserId,
        topics: impl IntoIterator<Item = Topic>,
    ) -> Result<(ConnectionId, OutboundReceiver)> {
        if user_id.trim().is_empty() {
            return Err(Error::invalid_connection("user id must not be empty"));
        }

        let connection_id = ConnectionId::new();
        let topics: HashSet<Topic> = topics.into_iter().filter(|t| !t.is_empty()).collect();
        let (sender, receiver) = mpsc::channel(self.outbound_capacity);

        // Insert into primary storage
        self.connections.insert(
            connection_id.clone(),
            Connection {
                user_id,
                topics: topics.clone(),
                sender,
                close_watchers: Vec::new(),
            },
        );

        // Update secondary index
        for topic in topics {
            self.topics
                .entry(topic)
                .or_default()
                .insert(connection_id.clone());
        }

        Ok((connection_id, receiver))
    }

    /// Add one more topic to a registered connection. Duplicate-safe.
    ///
    /// Returns `false` when the connection is no longer registered; a removed
    /// connection is never brought back.
    pub fn subscribe(&self, connection_id: &ConnectionId, topic: Topic) -> bool {
        if topic.is_empty() {
            return false;
        }

        // Hold the connection entry while touching the index so a concurrent
        // unregister cannot miss the new membership.
        match self.connections.get_mut(connection_id) {
            Some(mut connection) => {
                connection.topics.insert(topic.clone());
                self.topics
                    .entry(topic)
                    .or_default()
                    .insert(connection_id.clone());
                true
            }
            None => false,
        }
    }

    /// Unregister a connection: drop it from every member set and close its
    /// outbound queue. Returns `false` if it was already gone.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        // Removal from primary storage is the single gate; only the caller that
        // wins it owns the sender and closes the queue.
        let Some((_, connection)) = self.connections.remove(connection_id) else {
            return false;
        };

        for topic in &connection.topics {
            if let Some(mut members) = self.topics.get_mut(topic) {
                members.remove(connection_id);
                let now_empty = members.is_empty();
                drop(members); // Release shard lock before pruning

                if now_empty {
                    self.topics.remove_if(topic, |_, members| members.is_empty());
                }
            }
        }

        debug!(
            "Closed outbound queue for connection {} (user {})",
            connection_id.as_str(),
            connection.user_id
        );
        // `connection.sender` is dropped here, closing the queue exactly once.
        true
    }

    /// Signal that fires once this connection's outbound queue is closed,
    /// whether by `unregister` or by dispatch evicting it. `None` if the
    /// connection is already gone.
    pub fn watch_close(&self, connection_id: &ConnectionId) -> Option<CloseSignal> {
        let mut connection = self.connections.get_mut(connection_id)?;
        let (watcher, signal) = oneshot::channel();
        connection.close_watchers.push(watcher);
        Some(signal)
    }

    /// Number of connections currently subscribed to `topic`; 0 if unknown.
    pub fn active_count(&self, topic: &Topic) -> usize {
        self.topics.get(topic).map(|members| members.len()).unwrap_or(0)
    }

    pub fn is_member(&self, topic: &Topic, connection_id: &ConnectionId) -> bool {
        self.topics
            .get(topic)
            .map(|members| members.contains(connection_id))
            .unwrap_or(false)
    }

    pub fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// Total number of live connections across all topics.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of topics that currently have at least one member.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Snapshot a topic's member ids under a shard read lock.
    pub(crate) fn members(&self, topic: &Topic) -> Vec<ConnectionId> {
        self.topics
            .get(topic)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Non-blocking enqueue of one payload onto a connection's outbound queue.
    pub(crate) fn try_enqueue(&self, connection_id: &ConnectionId, payload: Bytes) -> Enqueue {
        let Some(connection) = self.connections.get(connection_id) else {
            return Enqueue::Missing;
        };

        match connection.sender.try_send(payload) {
            Ok(()) => Enqueue::Delivered,
            Err(TrySendError::Full(_)) => Enqueue::Saturated,
            Err(TrySendError::Closed(_)) => Enqueue::Disconnected,
        }
    }
}
