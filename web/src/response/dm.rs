//! Direct message response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A direct message as accepted by the send endpoint and pushed to live
/// connections of its conversation.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DirectMessage {
    pub(crate) id: String,
    pub(crate) dm_conversation_id: String,
    pub(crate) sender_id: String,
    pub(crate) content: String,
    pub(crate) timestamp: DateTime<Utc>,
}

impl DirectMessage {
    pub(crate) fn new(dm_conversation_id: String, sender_id: String, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            dm_conversation_id,
            sender_id,
            content,
            timestamp: Utc::now(),
        }
    }
}
