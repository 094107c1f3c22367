//! WebSocket HTTP handlers for the web layer.
//!
//! This module owns the transport side of a live connection: the upgrade
//! handlers and the per-connection reader/writer pumps. Topic membership,
//! outbound queues and dispatch live in the `hub` crate.

pub mod handler;
pub(crate) mod session;
