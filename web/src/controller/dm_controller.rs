use crate::controller::ApiResponse;
use crate::error::{require_non_empty, Error};
use crate::params::dm::SendParams;
use crate::response::dm::DirectMessage;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use events::DomainEvent;
use service::AppState;

use log::*;

/// POST send a direct message to a conversation
///
/// The message is pushed to every live connection of the conversation and
/// echoed back to the caller.
pub async fn send(
    State(app_state): State<AppState>,
    Json(params): Json<SendParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Send a Direct Message from: {params:?}");
    require_non_empty(&[
        ("dm_id", params.dm_id.as_str()),
        ("sender_id", params.sender_id.as_str()),
        ("content", params.content.as_str()),
    ])?;

    let message = DirectMessage::new(params.dm_id, params.sender_id, params.content);
    let record = serde_json::to_value(&message).map_err(hub::error::Error::from)?;

    app_state
        .event_publisher
        .publish(DomainEvent::DirectMessageSent {
            dm_id: message.dm_conversation_id.clone(),
            message: record,
        })
        .await;

    debug!("New Direct Message: {message:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), message)),
    ))
}
