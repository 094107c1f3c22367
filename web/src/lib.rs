//! HTTP and WebSocket surface of scenehub.
//!
//! Routes producers (direct-message send, scene join/leave) into the event
//! publisher, exposes scene presence, and upgrades sockets into live hub
//! connections.

use axum::http::{header, HeaderName, HeaderValue, Method};
use log::*;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use service::AppState;

mod controller;
mod error;
mod params;
mod response;
pub mod router;
pub mod ws;

pub use error::{Error, Result};

/// Bind the configured address and serve until the process is stopped.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_addr = app_state.config.listen_addr();
    let cors_layer = cors_layer(&app_state.config.allowed_origins);

    info!(
        "Server starting... listening for connections on http://{listen_addr} (env: {})",
        app_state.config.runtime_env()
    );

    let listener = TcpListener::bind(&listen_addr).await?;
    let app = router::define_routes(app_state).layer(cors_layer);

    axum::serve(listener, app).await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
        .allow_origin(origins)
}
