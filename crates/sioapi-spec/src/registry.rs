//! Registration engine: merges receivers and senders into the document.

use std::borrow::Cow;

use crate::error::SpecError;
use crate::model::{Ack, AckEnvelope, MessageDefinition, SpecificationDocument};
use crate::schema::{escape_pointer_token, rewrite_refs, Reference, StructuralSchema};
use crate::shape::{DocShape, ShapeDescriptor};

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The message was added and referenced from its channel union.
    Added,
    /// An identical message was already registered; nothing changed.
    Unchanged,
}

/// An inbound event handler to document (a `publish` message).
#[derive(Debug, Clone, Default)]
pub struct Receiver {
    pub event_name: String,
    /// Key in `components.messages`; defaults to the title-cased event name.
    pub message_name: Option<String>,
    /// The handler's doc comment.
    pub handler_doc: Option<String>,
    /// Shape of the acknowledgement the handler replies with.
    pub ack: DocShape,
    /// Shape of the request payload.
    pub payload: DocShape,
}

impl Receiver {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..Self::default()
        }
    }

    pub fn with_message_name(mut self, name: impl Into<String>) -> Self {
        self.message_name = Some(name.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.handler_doc = Some(doc.into());
        self
    }

    pub fn with_ack(mut self, ack: DocShape) -> Self {
        self.ack = ack;
        self
    }

    pub fn with_payload(mut self, payload: DocShape) -> Self {
        self.payload = payload;
        self
    }
}

/// An outbound event to document (a `subscribe` message).
#[derive(Debug, Clone, Default)]
pub struct Sender {
    pub event_name: String,
    pub payload: DocShape,
    pub description: Option<String>,
}

impl Sender {
    pub fn new(event_name: impl Into<String>, payload: DocShape) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Schemas a registration will add once it is known to be conflict free.
#[derive(Default)]
struct StagedSchemas(Vec<(String, StructuralSchema)>);

impl StagedSchemas {
    fn get(&self, name: &str) -> Option<&StructuralSchema> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

impl SpecificationDocument {
    /// Document an inbound event.
    ///
    /// The message is stored under `message_name` (default: the title-cased
    /// event name) and referenced from the root channel's `publish` union.
    /// Registering identical content twice is a no-op; registering different
    /// content under a taken message or schema name fails and leaves the
    /// document untouched.
    pub fn add_receiver(&mut self, receiver: Receiver) -> Result<Registration, SpecError> {
        let message_name = receiver
            .message_name
            .clone()
            .unwrap_or_else(|| title_case(&receiver.event_name));

        let mut staged = StagedSchemas::default();
        let ack = match &receiver.ack {
            DocShape::Absent => None,
            DocShape::NotProvided => Some(Ack::not_provided()),
            DocShape::Explicit(shape) => Some(Ack::Envelope(AckEnvelope::new(
                self.stage_schema(shape, &mut staged)?,
            ))),
        };
        let payload = self.payload_reference(&receiver.payload, &mut staged)?;

        let message = MessageDefinition {
            name: receiver.event_name.clone(),
            description: receiver.handler_doc.as_deref().and_then(describe),
            payload,
            ack,
        };

        let registration = self.commit(message_name.clone(), message, staged, Direction::Publish)?;
        tracing::debug!(
            event_name = %receiver.event_name,
            message_name = %message_name,
            ?registration,
            "receiver documented"
        );
        Ok(registration)
    }

    /// Document an outbound event.
    ///
    /// Keyed by the event name as-is and referenced from the root channel's
    /// `subscribe` union. Collisions behave as in [`add_receiver`](Self::add_receiver).
    pub fn add_sender(&mut self, sender: Sender) -> Result<Registration, SpecError> {
        let mut staged = StagedSchemas::default();
        let payload = self.payload_reference(&sender.payload, &mut staged)?;

        let message = MessageDefinition {
            name: sender.event_name.clone(),
            description: sender.description.clone().filter(|d| !d.is_empty()),
            payload,
            ack: None,
        };

        let registration =
            self.commit(sender.event_name.clone(), message, staged, Direction::Subscribe)?;
        tracing::debug!(event_name = %sender.event_name, ?registration, "sender documented");
        Ok(registration)
    }

    fn payload_reference(
        &self,
        payload: &DocShape,
        staged: &mut StagedSchemas,
    ) -> Result<Option<Reference>, SpecError> {
        match payload {
            DocShape::Absent => Ok(None),
            DocShape::NotProvided => Ok(Some(Reference::no_spec())),
            DocShape::Explicit(shape) => self.stage_schema(shape, staged).map(Some),
        }
    }

    /// Root the shape's internal references under its own component entry
    /// and stage it for insertion.
    fn stage_schema(
        &self,
        shape: &ShapeDescriptor,
        staged: &mut StagedSchemas,
    ) -> Result<Reference, SpecError> {
        let name = shape.name();
        let prefix = format!("/components/schemas/{}", escape_pointer_token(name));
        let schema = rewrite_refs(shape.schema().clone(), &prefix);

        let existing = self.components.schemas.get(name).or_else(|| staged.get(name));
        match existing {
            Some(current) if *current == schema => {}
            Some(_) => return Err(SpecError::SchemaConflict(name.to_string())),
            None => staged.0.push((name.to_string(), schema)),
        }
        Ok(Reference::schema(name))
    }

    fn commit(
        &mut self,
        message_name: String,
        message: MessageDefinition,
        staged: StagedSchemas,
        direction: Direction,
    ) -> Result<Registration, SpecError> {
        match self.components.messages.get(&message_name) {
            Some(current) if *current == message && staged.0.is_empty() => {
                return Ok(Registration::Unchanged);
            }
            Some(_) => return Err(SpecError::DuplicateMessageName(message_name)),
            None => {}
        }

        self.components.schemas.extend(staged.0);
        let reference = Reference::message(&message_name);
        self.components.messages.insert(message_name, message);

        let channel = &mut self.channels.root;
        let union = match direction {
            Direction::Publish => &mut channel.publish.message.one_of,
            Direction::Subscribe => &mut channel.subscribe.message.one_of,
        };
        union.push(reference);
        Ok(Registration::Added)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Publish,
    Subscribe,
}

/// Turn a handler doc comment into a message description.
///
/// The text gets one leading space if it has none, then its common
/// indentation is stripped so multi-line docs render as plain block text.
fn describe(doc: &str) -> Option<String> {
    if doc.is_empty() {
        return None;
    }
    let padded = if doc.starts_with(' ') {
        Cow::Borrowed(doc)
    } else {
        Cow::Owned(format!(" {}", doc))
    };
    Some(dedent(&padded))
}

/// Capitalize the first letter of every run of letters and lowercase the
/// rest: `get_download_list` becomes `Get_Download_List`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Remove the leading whitespace shared by every non-blank line.
///
/// Lines made only of spaces and tabs are emptied and ignored when computing
/// the margin.
pub fn dedent(text: &str) -> String {
    let is_blank = |line: &str| line.trim_start_matches([' ', '\t']).is_empty();
    let indent = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();

    let mut margin: Option<&str> = None;
    for line in text.split('\n').filter(|l| !is_blank(l)) {
        let current = &line[..indent(line)];
        margin = Some(match margin {
            None => current,
            Some(m) => {
                let common = m
                    .bytes()
                    .zip(current.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                &m[..common]
            }
        });
    }
    let margin = margin.map_or(0, str::len);

    text.split('\n')
        .map(|line| if is_blank(line) { "" } else { &line[margin..] })
        .collect::<Vec<_>>()
        .join("\n")
}
