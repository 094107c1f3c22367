use log::*;
use service::{config::Config, init_hub, logging::Logger, AppState};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!("Starting up scenehub...");

    let (hub, event_publisher) = init_hub(&config);
    let app_state = AppState::new(config, &hub, &event_publisher);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
