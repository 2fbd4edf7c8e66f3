//! AsyncAPI 2.5 document model for Socket.IO-style event servers.
//!
//! Holds the growing specification document (one `/` channel, one component
//! registry), merges receiver and sender registrations into it, and renders it
//! to YAML or JSON. Rendered documents can be parsed back and verified for
//! dangling `$ref`s.

pub mod error;
pub mod model;
pub mod parser;
pub mod registry;
pub mod render;
pub mod schema;
pub mod shape;

pub use error::SpecError;
pub use model::{
    Ack, AckEnvelope, Channel, ChannelHandlers, ChannelOperation, Channels, Components, Info,
    MessageDefinition, MessageUnion, Server, SpecificationDocument, ASYNCAPI_VERSION,
    DEFAULT_PROTOCOL,
};
pub use parser::{parse_document, parse_document_file};
pub use registry::{dedent, title_case, Receiver, Registration, Sender};
pub use render::DocFormat;
pub use schema::{rewrite_refs, PrimitiveType, Reference, StructuralSchema};
pub use shape::{DocShape, Shape, ShapeDescriptor};
