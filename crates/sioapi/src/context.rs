//! Per-event context handed to handlers.

use serde_json::Value;

use sioapi_validator::EmitValidationError;

use crate::socket::AsyncApiSocket;

/// The transport side of a connection: where emitted events go.
pub trait EventSink: Send + Sync {
    /// Deliver an event to the peer.
    fn emit(&self, event: &str, payload: Value);

    /// Session id of the connection, if the transport has one.
    fn sid(&self) -> Option<&str> {
        None
    }
}

/// Sink that drops everything. Useful for dispatching outside a connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &str, _payload: Value) {}
}

/// What a handler (or the default error handler) can reach while an event
/// is being processed.
pub struct EventContext<'a> {
    socket: &'a AsyncApiSocket,
    event: &'a str,
    sink: &'a dyn EventSink,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(socket: &'a AsyncApiSocket, event: &'a str, sink: &'a dyn EventSink) -> Self {
        Self {
            socket,
            event,
            sink,
        }
    }

    /// Name of the event being handled.
    pub fn event(&self) -> &str {
        self.event
    }

    pub fn sid(&self) -> Option<&str> {
        self.sink.sid()
    }

    /// Emit an event back to the peer.
    ///
    /// Events documented with a shape via
    /// [`doc_emit`](AsyncApiSocket::doc_emit) are validated first when
    /// validation is on; a mismatching payload is not sent.
    pub fn emit(&self, event: &str, payload: Value) -> Result<(), EmitValidationError> {
        self.socket.emit(event, payload, self.sink)
    }
}
