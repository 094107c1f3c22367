use crate::error::{Error, HubErrorKind, Result};
use std::fmt;

/// Lifecycle of a single live connection.
///
/// ```text
/// Connecting -> Registered -> Draining -> Closed
/// ```
///
/// `Connecting` may also go straight to `Closed` when the handshake fails.
/// There is no way back into `Registered`; a reconnecting client is a new
/// connection with a new `ConnectionId`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Registered,
    Draining,
    Closed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Registered) | (Connecting, Closed) | (Registered, Draining) | (Draining, Closed)
        )
    }

    /// Move to `next`, or fail if the edge is not part of the lifecycle.
    pub fn transition(&mut self, next: ConnectionState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error {
                source: None,
                error_kind: HubErrorKind::InvalidTransition { from: *self, to: next },
            });
        }
        *self = next;
        Ok(())
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Closed
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Registered => write!(f, "registered"),
            ConnectionState::Draining => write!(f, "draining"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}
