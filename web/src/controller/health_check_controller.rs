use crate::controller::ApiResponse;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use service::AppState;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    connections: usize,
}

/// GET service health and the number of live connections
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::new(
        StatusCode::OK.into(),
        Health {
            status: "healthy",
            connections: app_state.hub_ref().connection_count(),
        },
    ))
}
