//! Scene presence response DTOs

use serde::Serialize;

/// Live presence for one scene.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScenePresence {
    pub(crate) scene_id: String,
    /// Open WebSocket connections currently subscribed to the scene
    pub(crate) active_users: usize,
}
