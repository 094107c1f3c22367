use serde::Deserialize;

/// Query for `GET /ws/dms`
#[derive(Debug, Deserialize)]
pub(crate) struct ConnectParams {
    #[serde(default)]
    pub(crate) dm_id: String,
    #[serde(default)]
    pub(crate) user_id: String,
}

/// Body for `POST /api/v1/dms/send`
#[derive(Debug, Deserialize)]
pub(crate) struct SendParams {
    #[serde(default)]
    pub(crate) dm_id: String,
    #[serde(default)]
    pub(crate) sender_id: String,
    #[serde(default)]
    pub(crate) content: String,
}
