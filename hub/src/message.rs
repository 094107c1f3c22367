use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Routing key for a group of live connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A direct-message conversation between two users
    Conversation(String),
    /// A shared listening room
    Scene(String),
}

impl Topic {
    pub fn conversation(dm_id: impl Into<String>) -> Self {
        Topic::Conversation(dm_id.into())
    }

    pub fn scene(scene_id: impl Into<String>) -> Self {
        Topic::Scene(scene_id.into())
    }

    pub fn id(&self) -> &str {
        match self {
            Topic::Conversation(id) | Topic::Scene(id) => id,
        }
    }

    /// Topics with an empty id never get a member set.
    pub fn is_empty(&self) -> bool {
        self.id().is_empty()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Topic::Conversation(id) => write!(f, "dm:{id}"),
            Topic::Scene(id) => write!(f, "scene:{id}"),
        }
    }
}

/// One payload addressed to every current member of a topic.
/// The payload is opaque to the hub and cheap to clone per subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastEvent {
    pub topic: Topic,
    pub payload: Bytes,
}

impl BroadcastEvent {
    pub fn new(topic: Topic, payload: impl Into<Bytes>) -> Self {
        Self {
            topic,
            payload: payload.into(),
        }
    }
}

/// Trait for getting the wire event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Typed events pushed to sockets as `{"type": ..., "data": {...}}` JSON frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    // Direct messages (conversation-scoped)
    #[serde(rename = "dm_message_created")]
    DirectMessageCreated { dm_id: String, message: Value },

    // Presence (scene-scoped)
    #[serde(rename = "scene_user_joined")]
    SceneUserJoined {
        scene_id: String,
        user_id: String,
        active_users: usize,
    },
    #[serde(rename = "scene_user_left")]
    SceneUserLeft {
        scene_id: String,
        user_id: String,
        active_users: usize,
    },
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::DirectMessageCreated { .. } => "dm_message_created",
            Event::SceneUserJoined { .. } => "scene_user_joined",
            Event::SceneUserLeft { .. } => "scene_user_left",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub topic: Topic,
}

impl Message {
    /// Serialize the typed event into a broadcast addressed to this message's topic.
    pub fn into_broadcast(self) -> crate::error::Result<BroadcastEvent> {
        let payload = serde_json::to_vec(&self.event)?;
        Ok(BroadcastEvent::new(self.topic, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topic_display_separates_categories() {
        assert_eq!(Topic::conversation("abc").to_string(), "dm:abc");
        assert_eq!(Topic::scene("abc").to_string(), "scene:abc");
        assert_ne!(Topic::conversation("abc"), Topic::scene("abc"));
    }

    #[test]
    fn test_topic_is_empty() {
        assert!(Topic::scene("").is_empty());
        assert!(!Topic::conversation("dm-1").is_empty());
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = Event::SceneUserJoined {
            scene_id: "room-1".to_string(),
            user_id: "u1".to_string(),
            active_users: 3,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "scene_user_joined",
                "data": {"scene_id": "room-1", "user_id": "u1", "active_users": 3}
            })
        );
        assert_eq!(event.event_type(), "scene_user_joined");
    }

    #[test]
    fn test_message_into_broadcast_keeps_topic() {
        let message = Message {
            event: Event::DirectMessageCreated {
                dm_id: "dm-1".to_string(),
                message: json!({"content": "hi"}),
            },
            topic: Topic::conversation("dm-1"),
        };
        let broadcast = message.into_broadcast().unwrap();
        assert_eq!(broadcast.topic, Topic::conversation("dm-1"));

        let value: Value = serde_json::from_slice(&broadcast.payload).unwrap();
        assert_eq!(value["type"], "dm_message_created");
        assert_eq!(value["data"]["message"]["content"], "hi");
    }
}
