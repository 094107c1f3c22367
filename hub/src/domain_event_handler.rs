use crate::message::{Event as HubEvent, Message as HubMessage, Topic};
use crate::Hub;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by converting them to hub messages and dispatching
/// them to the live connections of the affected topic.
///
/// The producer decides which conversation or scene an event belongs to; this
/// handler only picks the topic category and builds the wire event.
pub struct HubDomainEventHandler {
    hub: Arc<Hub>,
}

impl HubDomainEventHandler {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    fn to_message(&self, event: &DomainEvent) -> HubMessage {
        match event {
            DomainEvent::DirectMessageSent { dm_id, message } => HubMessage {
                event: HubEvent::DirectMessageCreated {
                    dm_id: dm_id.clone(),
                    message: message.clone(),
                },
                topic: Topic::conversation(dm_id.clone()),
            },
            DomainEvent::SceneJoined { scene_id, user_id } => {
                let topic = Topic::scene(scene_id.clone());
                HubMessage {
                    event: HubEvent::SceneUserJoined {
                        scene_id: scene_id.clone(),
                        user_id: user_id.clone(),
                        active_users: self.hub.active_count(&topic),
                    },
                    topic,
                }
            }
            DomainEvent::SceneLeft { scene_id, user_id } => {
                let topic = Topic::scene(scene_id.clone());
                HubMessage {
                    event: HubEvent::SceneUserLeft {
                        scene_id: scene_id.clone(),
                        user_id: user_id.clone(),
                        active_users: self.hub.active_count(&topic),
                    },
                    topic,
                }
            }
        }
    }
}

#[async_trait]
impl EventHandler for HubDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        let message = self.to_message(event);
        let topic = message.topic.clone();
        let report = self.hub.send_message(message);

        debug!(
            "Handled {} for {topic}: delivered={} evicted={}",
            event.name(),
            report.delivered,
            report.evicted
        );
    }
}
