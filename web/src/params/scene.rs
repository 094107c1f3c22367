use serde::Deserialize;

/// Query for `GET /ws/scenes`
#[derive(Debug, Deserialize)]
pub(crate) struct ConnectParams {
    #[serde(default)]
    pub(crate) scene_id: String,
    #[serde(default)]
    pub(crate) user_id: String,
}

/// Body for `POST /api/v1/scenes/join` and `POST /api/v1/scenes/leave`
#[derive(Debug, Deserialize)]
pub(crate) struct MembershipParams {
    #[serde(default, alias = "sceneID")]
    pub(crate) scene_id: String,
    #[serde(default, alias = "userID")]
    pub(crate) user_id: String,
}

/// Query for `GET /api/v1/scenes/active`
#[derive(Debug, Deserialize)]
pub(crate) struct ActiveParams {
    #[serde(default)]
    pub(crate) scene_id: String,
}
