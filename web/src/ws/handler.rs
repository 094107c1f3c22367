use crate::error::{require_non_empty, Result};
use crate::params::{dm, scene};
use crate::ws::session::{Inbound, Session};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::Response;
use hub::message::Topic;
use log::*;
use service::AppState;

/// GET /ws/dms?dm_id=..&user_id=..
///
/// Upgrades to a WebSocket subscribed to one direct-message conversation.
/// Frames the client sends are rebroadcast to everyone in the conversation.
pub(crate) async fn dm_ws_handler(
    State(app_state): State<AppState>,
    Query(params): Query<dm::ConnectParams>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    require_non_empty(&[
        ("dm_id", params.dm_id.as_str()),
        ("user_id", params.user_id.as_str()),
    ])?;
    debug!(
        "Upgrading DM connection for user {} in {}",
        params.user_id, params.dm_id
    );

    let topic = Topic::conversation(params.dm_id);
    let session = Session::new(
        app_state.hub.clone(),
        params.user_id,
        vec![topic.clone()],
        Inbound::Relay(topic),
    );

    Ok(ws.on_upgrade(move |socket| session.run(socket)))
}

/// GET /ws/scenes?scene_id=..&user_id=..
///
/// Upgrades to a WebSocket subscribed to one scene. Inbound frames are only
/// read to detect the client going away; the socket counts towards the
/// scene's active users while it is open.
pub(crate) async fn scene_ws_handler(
    State(app_state): State<AppState>,
    Query(params): Query<scene::ConnectParams>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    require_non_empty(&[
        ("scene_id", params.scene_id.as_str()),
        ("user_id", params.user_id.as_str()),
    ])?;
    debug!(
        "Upgrading scene connection for user {} in {}",
        params.user_id, params.scene_id
    );

    let session = Session::new(
        app_state.hub.clone(),
        params.user_id,
        vec![Topic::scene(params.scene_id)],
        Inbound::Discard,
    );

    Ok(ws.on_upgrade(move |socket| session.run(socket)))
}
