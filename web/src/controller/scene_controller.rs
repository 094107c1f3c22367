use crate::controller::ApiResponse;
use crate::error::{require_non_empty, Error};
use crate::params::scene::{ActiveParams, MembershipParams};
use crate::response::scene::ScenePresence;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use events::DomainEvent;
use hub::message::Topic;
use service::AppState;

use log::*;

/// POST announce that a user joined a scene
pub async fn join(
    State(app_state): State<AppState>,
    Json(params): Json<MembershipParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Join Scene: {params:?}");
    validate_membership(&params)?;

    app_state
        .event_publisher
        .publish(DomainEvent::SceneJoined {
            scene_id: params.scene_id.clone(),
            user_id: params.user_id,
        })
        .await;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        presence(&app_state, params.scene_id),
    )))
}

/// POST announce that a user left a scene
pub async fn leave(
    State(app_state): State<AppState>,
    Json(params): Json<MembershipParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Leave Scene: {params:?}");
    validate_membership(&params)?;

    app_state
        .event_publisher
        .publish(DomainEvent::SceneLeft {
            scene_id: params.scene_id.clone(),
            user_id: params.user_id,
        })
        .await;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        presence(&app_state, params.scene_id),
    )))
}

/// GET the number of live connections in a scene
pub async fn active(
    State(app_state): State<AppState>,
    Query(params): Query<ActiveParams>,
) -> Result<impl IntoResponse, Error> {
    require_non_empty(&[("scene_id", params.scene_id.as_str())])?;

    let presence = presence(&app_state, params.scene_id);
    debug!(
        "Scene {} has {} active user(s)",
        presence.scene_id, presence.active_users
    );

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), presence)))
}

fn validate_membership(params: &MembershipParams) -> Result<(), Error> {
    require_non_empty(&[
        ("scene_id", params.scene_id.as_str()),
        ("user_id", params.user_id.as_str()),
    ])
}

fn presence(app_state: &AppState, scene_id: String) -> ScenePresence {
    let active_users = app_state.hub_ref().active_count(&Topic::scene(scene_id.clone()));
    ScenePresence {
        scene_id,
        active_users,
    }
}
