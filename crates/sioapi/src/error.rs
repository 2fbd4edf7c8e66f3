use thiserror::Error;

use sioapi_spec::SpecError;
use sioapi_validator::{EventError, ShapeError};

/// Errors raised by the socket wrapper.
#[derive(Debug, Error)]
pub enum SocketError {
    /// No handler is registered for the dispatched event.
    #[error("no handler registered for event '{0}'")]
    UnknownEvent(String),

    /// A handler is already registered for this event.
    #[error("a handler is already registered for event '{0}'")]
    DuplicateHandler(String),

    /// The registration could not be recorded in the document.
    #[error(transparent)]
    Registration(#[from] SpecError),

    /// A declared shape could not be compiled for validation.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// Handling the event failed and the default error handler re-raised it.
    #[error(transparent)]
    Event(#[from] EventError),
}

impl SocketError {
    /// The event error behind a failed dispatch.
    pub fn as_event_error(&self) -> Option<&EventError> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }
}
