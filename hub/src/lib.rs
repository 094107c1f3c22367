//! Live connection registry and broadcast hub.
//!
//! This crate tracks which live connections are interested in which topic (a
//! direct-message conversation or a scene) and pushes events to them.
//!
//! # Architecture
//!
//! - **Topic-keyed registry**: connections are owned by id in one `DashMap`;
//!   a second `DashMap` indexes member ids by `Topic` for dispatch. Locks are
//!   taken `connections` first, then `topics`, never the reverse: `subscribe`
//!   holds the connection entry while it edits the topic index, and dispatch
//!   releases its topic snapshot before touching any connection.
//! - **Bounded outbound queues**: each connection gets a fixed-capacity FIFO.
//!   The registry holds the only sender; unregistering drops it, which is how
//!   the writer task learns to drain and stop.
//! - **Eviction over buffering**: dispatch never waits. A subscriber whose
//!   queue is full is treated as dead and unregistered on the spot, so one
//!   slow peer cannot stall the producer or the other members.
//! - **Ephemeral events**: a connection that is not live when an event is
//!   dispatched never sees it.
//!
//! # Message Flow
//!
//! 1. The web layer upgrades a socket and calls `Hub::register_connection`
//!    with the user id and the topics taken from the request
//! 2. It spawns a writer task draining the returned `OutboundReceiver` and a
//!    reader task that calls `Hub::unregister_connection` on close or error;
//!    `Hub::watch_close` tells it when the queue was closed from the hub side
//! 3. A producer (e.g. sending a direct message) publishes a `DomainEvent`
//! 4. `HubDomainEventHandler` turns it into a typed `Message` and the hub
//!    dispatches the serialized payload to every member of the topic
//!
//! # Example: pushing an event
//!
//! ```rust,ignore
//! use hub::message::{Event as HubEvent, Message as HubMessage, Topic};
//!
//! app_state.hub.send_message(HubMessage {
//!     event: HubEvent::DirectMessageCreated { dm_id: dm_id.clone(), message },
//!     topic: Topic::conversation(dm_id),
//! });
//! ```
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with topic index and type-safe ConnectionId
//! - `manager`: `Hub`, registration front door and the broadcast dispatcher
//! - `message`: Topic, BroadcastEvent and typed wire events
//! - `lifecycle`: connection state machine
//! - `domain_event_handler`: bridge from `events::DomainEvent` to dispatch
//! - `error`: hub error types

pub mod connection;
pub mod domain_event_handler;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod message;

pub use manager::Hub;
