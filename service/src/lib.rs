use config::Config;
use events::EventPublisher;
use hub::domain_event_handler::HubDomainEventHandler;
use hub::Hub;
use log::info;
use std::sync::Arc;

pub mod config;
pub mod logging;

/// Builds the hub sized from config and a publisher that forwards domain
/// events into it.
pub fn init_hub(config: &Config) -> (Arc<Hub>, Arc<EventPublisher>) {
    info!(
        "Hub config: outbound_queue_capacity={}",
        config.outbound_queue_capacity
    );

    let hub = Arc::new(Hub::new(config.outbound_queue_capacity));
    let event_publisher = EventPublisher::new()
        .with_handler(Arc::new(HubDomainEventHandler::new(Arc::clone(&hub))));

    (hub, Arc::new(event_publisher))
}

// Service-level state shared by every handler
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub hub: Arc<Hub>,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(app_config: Config, hub: &Arc<Hub>, event_publisher: &Arc<EventPublisher>) -> Self {
        Self {
            config: app_config,
            hub: Arc::clone(hub),
            event_publisher: Arc::clone(event_publisher),
        }
    }

    pub fn hub_ref(&self) -> &Hub {
        self.hub.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use hub::message::Topic;

    #[tokio::test]
    async fn test_init_hub_wires_publisher_to_hub() {
        let config = Config::try_parse_from(["scenehub", "--outbound-queue-capacity", "4"]).unwrap();
        let (hub, publisher) = init_hub(&config);

        assert_eq!(hub.registry().outbound_capacity(), 4);
        assert_eq!(publisher.handler_count(), 1);

        let (_id, mut rx) = hub
            .register_connection("u1".to_string(), [Topic::conversation("dm-1")])
            .unwrap();
        publisher
            .publish(events::DomainEvent::DirectMessageSent {
                dm_id: "dm-1".to_string(),
                message: serde_json::json!({"content": "hi"}),
            })
            .await;
        assert!(rx.recv().await.is_some());
    }
}
