//! In-process test client.

use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use sioapi_validator::EventArgs;

use crate::context::EventSink;
use crate::error::SocketError;
use crate::socket::AsyncApiSocket;

/// An event the server sent to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    pub name: String,
    pub args: Vec<Value>,
}

/// A client connected straight to an [`AsyncApiSocket`], without a network
/// transport. Everything the server emits to it is queued until read with
/// [`get_received`](Self::get_received).
pub struct TestClient<'a> {
    socket: &'a AsyncApiSocket,
    sid: String,
    received: Mutex<Vec<ReceivedEvent>>,
}

impl<'a> TestClient<'a> {
    pub fn new(socket: &'a AsyncApiSocket) -> Self {
        Self {
            socket,
            sid: Uuid::new_v4().to_string(),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Send an event with a single payload and return the server's acknowledgement.
    pub fn emit(&self, event: &str, payload: Value) -> Result<Option<Value>, SocketError> {
        self.emit_args(event, EventArgs::payload(payload))
    }

    /// Send an event with arbitrary arguments.
    pub fn emit_args(&self, event: &str, args: EventArgs) -> Result<Option<Value>, SocketError> {
        tracing::debug!(sid = %self.sid, event_name = event, "test client emit");
        self.socket.dispatch(event, args, self)
    }

    /// Drain the events received so far, oldest first.
    pub fn get_received(&self) -> Vec<ReceivedEvent> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl EventSink for TestClient<'_> {
    fn emit(&self, event: &str, payload: Value) {
        self.received.lock().push(ReceivedEvent {
            name: event.to_string(),
            args: vec![payload],
        });
    }

    fn sid(&self) -> Option<&str> {
        Some(&self.sid)
    }
}
