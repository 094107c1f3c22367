use crate::controller::{dm_controller, health_check_controller, scene_controller};
use crate::ws::handler::{dm_ws_handler, scene_ws_handler};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes(app_state.clone()))
        .merge(dm_routes(app_state.clone()))
        .merge(scene_routes(app_state.clone()))
        .merge(ws_routes(app_state))
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}

fn dm_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/v1/dms/send", post(dm_controller::send))
        .with_state(app_state)
}

fn scene_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/v1/scenes/join", post(scene_controller::join))
        .route("/api/v1/scenes/leave", post(scene_controller::leave))
        .route("/api/v1/scenes/active", get(scene_controller::active))
        .with_state(app_state)
}

fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws/dms", get(dm_ws_handler))
        .route("/ws/scenes", get(scene_ws_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use clap::Parser;
    use hub::message::Topic;
    use serde_json::{json, Value};
    use service::config::Config;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Config::try_parse_from(["scenehub"]).unwrap();
        let (hub, event_publisher) = service::init_hub(&config);
        AppState::new(config, &hub, &event_publisher)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_connection_count() {
        let state = test_state();
        let (_id, _rx) = state
            .hub
            .register_connection("u1".to_string(), [Topic::scene("room-1")])
            .unwrap();

        let response = define_routes(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"status_code": 200, "data": {"status": "healthy", "connections": 1}})
        );
    }

    #[tokio::test]
    async fn test_send_dm_pushes_to_live_conversation() {
        let state = test_state();
        let (_id, mut rx) = state
            .hub
            .register_connection("u2".to_string(), [Topic::conversation("dm-1")])
            .unwrap();

        let response = define_routes(state)
            .oneshot(post_json(
                "/api/v1/dms/send",
                json!({"dm_id": "dm-1", "sender_id": "u1", "content": "hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["content"], "hello");
        assert_eq!(body["data"]["dm_conversation_id"], "dm-1");

        let pushed: Value = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(pushed["type"], "dm_message_created");
        assert_eq!(pushed["data"]["message"]["id"], body["data"]["id"]);
    }

    #[tokio::test]
    async fn test_send_dm_rejects_blank_content() {
        let response = define_routes(test_state())
            .oneshot(post_json(
                "/api/v1/dms/send",
                json!({"dm_id": "dm-1", "sender_id": "u1", "content": "  "}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_join_scene_announces_to_members() {
        let state = test_state();
        let (_id, mut rx) = state
            .hub
            .register_connection("u1".to_string(), [Topic::scene("room-1")])
            .unwrap();

        let response = define_routes(state)
            .oneshot(post_json(
                "/api/v1/scenes/join",
                json!({"sceneID": "room-1", "userID": "u2"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["data"],
            json!({"scene_id": "room-1", "active_users": 1})
        );

        let pushed: Value = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(pushed["type"], "scene_user_joined");
        assert_eq!(pushed["data"]["user_id"], "u2");
    }

    #[tokio::test]
    async fn test_leave_scene_requires_user() {
        let response = define_routes(test_state())
            .oneshot(post_json(
                "/api/v1/scenes/leave",
                json!({"scene_id": "room-1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_active_users_for_unknown_scene_is_zero() {
        let response = define_routes(test_state())
            .oneshot(
                Request::get("/api/v1/scenes/active?scene_id=nowhere")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["active_users"], 0);
    }

    #[tokio::test]
    async fn test_ws_route_without_upgrade_is_rejected() {
        let response = define_routes(test_state())
            .oneshot(
                Request::get("/ws/scenes?scene_id=room-1&user_id=u1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
