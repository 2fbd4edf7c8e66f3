//! AsyncAPI documentation and payload validation for Socket.IO-style event servers.
//!
//! [`AsyncApiSocket`] sits between a transport and the application's event
//! handlers. Every registration is recorded in an AsyncAPI 2.5 document, and
//! with validation enabled every inbound payload, acknowledgement and
//! documented emit is checked against its declared shape.
//!
//! ```ignore
//! use sioapi::{AsyncApiSocket, SocketConfig};
//!
//! let mut socket = AsyncApiSocket::new(SocketConfig::new().with_validation(true));
//! socket.on_typed("download_file", Some("Queue a download"), |_ctx, req: DownloadFileRequest| {
//!     Ok(DownloadAccepted::accepted())
//! })?;
//! println!("{}", socket.get_yaml()?);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod socket;
pub mod testing;

pub use config::SocketConfig;
pub use context::{EventContext, EventSink, NullSink};
pub use error::SocketError;
pub use socket::{AsyncApiSocket, ErrorDisposition, EventOptions};
pub use testing::{ReceivedEvent, TestClient};

pub use sioapi_spec::{DocShape, Shape, ShapeDescriptor, SpecError, SpecificationDocument};
pub use sioapi_validator::{
    EmitValidationError, EventArgs, EventError, Reply, RequestValidationError,
    ResponseValidationError, ShapeMismatch,
};
