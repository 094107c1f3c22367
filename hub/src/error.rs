//! Error types for the `hub` crate.
use crate::lifecycle::ConnectionState;
use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by the hub. Delivery problems (unknown topics, saturated or
/// vanished subscribers, repeated unregisters) are absorbed internally and never
/// show up here; only caller mistakes and serialization failures do.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: HubErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum HubErrorKind {
    /// A connection was submitted without the identity it must carry.
    InvalidConnection(String),
    /// A lifecycle edge that the connection state machine does not allow.
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// A typed event could not be turned into payload bytes.
    Serialization,
}

impl Error {
    pub fn invalid_connection(reason: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: HubErrorKind::InvalidConnection(reason.into()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            HubErrorKind::InvalidConnection(reason) => write!(f, "invalid connection: {reason}"),
            HubErrorKind::InvalidTransition { from, to } => {
                write!(f, "invalid connection state transition {from} -> {to}")
            }
            HubErrorKind::Serialization => write!(f, "failed to serialize hub event"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: HubErrorKind::Serialization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_transition() {
        let err = Error {
            source: None,
            error_kind: HubErrorKind::InvalidTransition {
                from: ConnectionState::Closed,
                to: ConnectionState::Registered,
            },
        };
        assert_eq!(
            err.to_string(),
            "invalid connection state transition closed -> registered"
        );
    }

    #[test]
    fn test_serde_error_keeps_source() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = serde_err.into();
        assert_eq!(err.error_kind, HubErrorKind::Serialization);
        assert!(err.source().is_some());
    }
}
