use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hub::error::{Error as HubError, HubErrorKind};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

/// Web layer error. Request problems are caught here before they reach the
/// hub; hub errors are translated to status codes in `IntoResponse`.
#[derive(Debug)]
pub enum Error {
    /// A required request field was missing or blank.
    Validation(String),
    Hub(HubError),
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Validation(_) => None,
            Error::Hub(err) => Some(err),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        match self {
            Error::Validation(message) => write!(fmt, "validation error: {message}"),
            Error::Hub(err) => write!(fmt, "{err}"),
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(message) => {
                debug!("Rejecting request: {message}");
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            Error::Hub(err) => match err.error_kind {
                HubErrorKind::InvalidConnection(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY").into_response()
                }
                HubErrorKind::InvalidTransition { .. } | HubErrorKind::Serialization => {
                    error!("Hub error while handling request: {err}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
        }
    }
}

impl From<HubError> for Error {
    fn from(err: HubError) -> Self {
        Error::Hub(err)
    }
}

/// Fail with `Error::Validation` naming the first blank field.
pub(crate) fn require_non_empty(fields: &[(&str, &str)]) -> Result<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(Error::Validation(format!("{name} cannot be empty"))),
        None => Ok(()),
    }
}
