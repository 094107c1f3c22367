//! Event system infrastructure for scenehub.
//!
//! This crate provides the event system that decouples producers (the
//! message-send and scene join/leave actions) from delivery concerns like the
//! live connection hub.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates, avoiding circular
//! dependencies. Record data is carried as serialized JSON values.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Identifier of a conversation, scene or user as handed out by the storage layer.
pub type Id = String;

/// Domain events that represent business-level changes in the system.
/// These events are emitted after the producing operation has succeeded.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A new direct message was accepted for a conversation.
    /// Pushed to every live connection watching that conversation.
    DirectMessageSent {
        dm_id: Id,
        /// Complete serialized message record (id, sender, content, timestamp).
        message: Value,
    },
    /// A user joined a scene.
    SceneJoined { scene_id: Id, user_id: Id },
    /// A user left a scene.
    SceneLeft { scene_id: Id, user_id: Id },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::DirectMessageSent { .. } => "DirectMessageSent",
            DomainEvent::SceneJoined { .. } => "SceneJoined",
            DomainEvent::SceneLeft { .. } => "SceneLeft",
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like pushing to live connections,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers, in order.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
