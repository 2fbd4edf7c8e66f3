use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::{PrimitiveType, Reference, StructuralSchema, NO_SPEC};

/// The AsyncAPI version every document declares.
pub const ASYNCAPI_VERSION: &str = "2.5.0";

/// Default server protocol.
pub const DEFAULT_PROTOCOL: &str = "socketio";

/// Appended to every `info.description`.
const DISCLAIMER: &str = "
<br/> AsyncAPI has no Socket.IO binding yet, so a WebSocket-like syntax is used.
Socket.IO acknowledgement values are documented with the `x-ack` extension keyword.
Do **NOT** generate code from this document because of these limitations.
";

/// A complete AsyncAPI document for one event server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationDocument {
    /// Always [`ASYNCAPI_VERSION`].
    pub asyncapi: String,
    pub info: Info,
    #[serde(default)]
    pub servers: BTreeMap<String, Server>,
    pub channels: Channels,
    pub components: Components,
}

/// The `info` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One entry of the `servers` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    pub protocol: String,
}

/// The channel block. Only the root channel `/` is supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channels {
    #[serde(rename = "/")]
    pub root: Channel,
}

/// The root channel: messages the server receives (`publish`) and sends (`subscribe`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub publish: ChannelOperation,
    pub subscribe: ChannelOperation,
    #[serde(rename = "x-handlers", default)]
    pub handlers: ChannelHandlers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelOperation {
    pub message: MessageUnion,
}

/// An ordered, append-only list of message references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageUnion {
    #[serde(rename = "oneOf", default)]
    pub one_of: Vec<Reference>,
}

/// The `x-handlers` extension of the root channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandlers {
    pub disconnect: String,
}

impl Default for ChannelHandlers {
    fn default() -> Self {
        Self {
            disconnect: "disconnect".to_string(),
        }
    }
}

/// Named messages and named schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub messages: BTreeMap<String, MessageDefinition>,
    #[serde(default)]
    pub schemas: BTreeMap<String, StructuralSchema>,
}

/// One documented event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDefinition {
    /// The event name on the wire.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Reference>,
    #[serde(rename = "x-ack", default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<Ack>,
}

/// What a receiver documents under `x-ack`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ack {
    /// A declared reply shape wrapped in the success/errors envelope.
    Envelope(AckEnvelope),
    /// A bare reference; the handler replies without a declared shape.
    Placeholder(Reference),
}

impl Ack {
    /// The `NoSpec` placeholder for a reply without a declared shape.
    pub fn not_provided() -> Self {
        Self::Placeholder(Reference::no_spec())
    }

    /// The schema the reply data is described by.
    pub fn data(&self) -> &Reference {
        match self {
            Self::Envelope(envelope) => &envelope.data,
            Self::Placeholder(reference) => reference,
        }
    }
}

/// The `x-ack` envelope of a receiver: the reply data plus success/error fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckEnvelope {
    pub data: Reference,
    pub success: StructuralSchema,
    pub errors: StructuralSchema,
}

impl AckEnvelope {
    pub fn new(data: Reference) -> Self {
        Self {
            data,
            success: StructuralSchema::primitive(PrimitiveType::Boolean),
            errors: StructuralSchema::nullable(PrimitiveType::Array).with_items(
                StructuralSchema::primitive(PrimitiveType::String),
            ),
        }
    }
}

impl SpecificationDocument {
    /// Build the document scaffolding: info, one server, the empty root
    /// channel and the `NoSpec` placeholder schema.
    ///
    /// Every call returns a fresh document; nothing is shared between calls.
    pub fn default_init(
        version: &str,
        title: &str,
        description: &str,
        server_url: &str,
        server_name: &str,
        server_protocol: &str,
    ) -> Self {
        tracing::info!(
            server_url,
            server_name,
            server_protocol,
            "initializing AsyncAPI document"
        );

        let mut servers = BTreeMap::new();
        servers.insert(
            server_name.to_string(),
            Server {
                url: server_url.to_string(),
                protocol: server_protocol.to_string(),
            },
        );

        let mut schemas = BTreeMap::new();
        schemas.insert(NO_SPEC.to_string(), StructuralSchema::no_spec());

        Self {
            asyncapi: ASYNCAPI_VERSION.to_string(),
            info: Info {
                title: title.to_string(),
                version: version.to_string(),
                description: Some(format!("{}{}", description, DISCLAIMER)),
            },
            servers,
            channels: Channels {
                root: Channel {
                    publish: ChannelOperation::default(),
                    subscribe: ChannelOperation::default(),
                    handlers: ChannelHandlers::default(),
                },
            },
            components: Components {
                messages: BTreeMap::new(),
                schemas,
            },
        }
    }

    /// References of every inbound (publish) message, in registration order.
    pub fn publish_messages(&self) -> &[Reference] {
        &self.channels.root.publish.message.one_of
    }

    /// References of every outbound (subscribe) message, in registration order.
    pub fn subscribe_messages(&self) -> &[Reference] {
        &self.channels.root.subscribe.message.one_of
    }

    pub fn message(&self, name: &str) -> Option<&MessageDefinition> {
        self.components.messages.get(name)
    }

    pub fn schema(&self, name: &str) -> Option<&StructuralSchema> {
        self.components.schemas.get(name)
    }
}
