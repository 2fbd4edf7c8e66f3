//! The application wrapper: event registration, dispatch and documentation.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use sioapi_spec::{DocShape, Receiver, Sender, Shape, SpecError, SpecificationDocument};
use sioapi_telemetry::{
    log_contract_violation, log_doc_initialized, log_doc_rendered, log_handler_error,
    log_receiver_registered, log_sender_registered,
};
use sioapi_validator::{
    CompiledShape, EmitValidationError, EventArgs, EventError, MismatchDetail, Reply,
    RequestValidationError, ShapeMismatch, ValidationChain,
};

use crate::config::SocketConfig;
use crate::context::{EventContext, EventSink};
use crate::error::SocketError;
use crate::testing::TestClient;

type Handler = Arc<dyn Fn(&EventContext<'_>, &EventArgs) -> anyhow::Result<Reply> + Send + Sync>;

type ErrorHandler = Arc<dyn Fn(&EventError, &EventContext<'_>) -> ErrorDisposition + Send + Sync>;

/// What the default error handler decided to do with a failed event.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDisposition {
    /// Swallow the error and acknowledge with this value instead.
    Respond(Option<Value>),
    /// Propagate the error to the transport as a server fault.
    Raise,
}

/// Documentation and validation options of one event handler.
#[derive(Debug, Clone, Default)]
pub struct EventOptions {
    /// Shape of the inbound payload.
    pub request: DocShape,
    /// Shape of the acknowledgement.
    pub response: DocShape,
    /// Handler description for the document.
    pub doc: Option<String>,
    /// Key in `components.messages`; defaults to the title-cased event name.
    pub message_name: Option<String>,
}

impl EventOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(mut self, shape: DocShape) -> Self {
        self.request = shape;
        self
    }

    pub fn with_response(mut self, shape: DocShape) -> Self {
        self.response = shape;
        self
    }

    pub fn request_of<T: Shape>(self) -> Self {
        self.with_request(DocShape::of::<T>())
    }

    pub fn response_of<T: Shape>(self) -> Self {
        self.with_response(DocShape::of::<T>())
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_message_name(mut self, name: impl Into<String>) -> Self {
        self.message_name = Some(name.into());
        self
    }
}

struct RegisteredHandler {
    chain: ValidationChain,
    handler: Handler,
}

/// An event server front that documents and validates its handlers.
///
/// Registration happens at startup through `&mut self`; dispatching takes
/// `&self` and may run concurrently from several connections.
pub struct AsyncApiSocket {
    config: SocketConfig,
    doc: SpecificationDocument,
    handlers: HashMap<String, RegisteredHandler>,
    emits: HashMap<String, Arc<CompiledShape>>,
    error_handler: Option<ErrorHandler>,
}

impl AsyncApiSocket {
    pub fn new(config: SocketConfig) -> Self {
        let doc = SpecificationDocument::default_init(
            &config.version,
            &config.title,
            &config.description,
            &config.server_url,
            &config.server_name,
            &config.server_protocol,
        );
        log_doc_initialized!(
            title = %config.title,
            validate = config.validate,
            generate_docs = config.generate_docs,
            "socket created"
        );
        Self {
            config,
            doc,
            handlers: HashMap::new(),
            emits: HashMap::new(),
            error_handler: None,
        }
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Register a handler for an inbound event.
    ///
    /// The request shape documents the payload, the response shape the
    /// acknowledgement. With validation on, explicit shapes are enforced on
    /// every dispatch.
    pub fn on<F>(
        &mut self,
        event: impl Into<String>,
        options: EventOptions,
        handler: F,
    ) -> Result<(), SocketError>
    where
        F: Fn(&EventContext<'_>, &EventArgs) -> anyhow::Result<Reply> + Send + Sync + 'static,
    {
        let event = event.into();
        if self.handlers.contains_key(&event) {
            return Err(SocketError::DuplicateHandler(event));
        }

        let chain = ValidationChain::from_shapes(
            event.as_str(),
            &options.request,
            &options.response,
            self.config.validate,
        )?;

        if self.config.generate_docs {
            let mut receiver = Receiver::new(event.as_str())
                .with_payload(options.request)
                .with_ack(options.response);
            receiver.message_name = options.message_name;
            receiver.handler_doc = options.doc;
            let registration = self.doc.add_receiver(receiver)?;
            log_receiver_registered!(event_name = %event, ?registration, "handler registered");
        }

        self.handlers.insert(
            event,
            RegisteredHandler {
                chain,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Register a handler whose shapes come from its Rust types.
    ///
    /// The validated request is decoded into `Req` (serde defaults apply) and
    /// the `Resp` value is acknowledged as its JSON text. A `()` reply
    /// documents no acknowledgement and sends none. A call without a request
    /// payload fails request validation.
    pub fn on_typed<Req, Resp, F>(
        &mut self,
        event: impl Into<String>,
        doc: Option<&str>,
        handler: F,
    ) -> Result<(), SocketError>
    where
        Req: DeserializeOwned + Shape + 'static,
        Resp: Serialize + Shape + 'static,
        F: Fn(&EventContext<'_>, Req) -> anyhow::Result<Resp> + Send + Sync + 'static,
    {
        let unit_reply = TypeId::of::<Resp>() == TypeId::of::<()>();
        let mut options = EventOptions::new().request_of::<Req>();
        if !unit_reply {
            options = options.response_of::<Resp>();
        }
        options.doc = doc.map(str::to_string);

        self.on(event, options, move |ctx, args| {
            let request = decode_request::<Req>(args)?;
            let response = handler(ctx, request)?;
            if unit_reply {
                return Ok(Reply::None);
            }
            Ok(Reply::model(&response)?)
        })
    }

    /// Document an outbound event and remember its shape for emit validation.
    pub fn doc_emit(
        &mut self,
        event: impl Into<String>,
        shape: DocShape,
        description: Option<&str>,
    ) -> Result<(), SocketError> {
        let event = event.into();
        let compiled = shape
            .descriptor()
            .map(|d| CompiledShape::compile(d).map(Arc::new))
            .transpose()?;

        if self.config.generate_docs {
            let mut sender = Sender::new(event.as_str(), shape);
            sender.description = description.map(str::to_string);
            let registration = self.doc.add_sender(sender)?;
            log_sender_registered!(event_name = %event, ?registration, "emit documented");
        }

        if let Some(compiled) = compiled {
            self.emits.insert(event, compiled);
        }
        Ok(())
    }

    /// Install the default error handler every failed event is routed to.
    ///
    /// Without one, every error is raised.
    pub fn on_error_default<F>(&mut self, handler: F)
    where
        F: Fn(&EventError, &EventContext<'_>) -> ErrorDisposition + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
    }

    /// Transport entry point: run the handler of `event` under its
    /// validation chain and return the acknowledgement.
    pub fn dispatch(
        &self,
        event: &str,
        args: EventArgs,
        sink: &dyn EventSink,
    ) -> Result<Option<Value>, SocketError> {
        let registered = self
            .handlers
            .get(event)
            .ok_or_else(|| SocketError::UnknownEvent(event.to_string()))?;

        let ctx = EventContext::new(self, event, sink);
        match registered
            .chain
            .invoke(&args, |args| (registered.handler)(&ctx, args))
        {
            Ok(ack) => Ok(ack),
            Err(err) => self.route_error(err, &ctx),
        }
    }

    fn route_error(
        &self,
        err: EventError,
        ctx: &EventContext<'_>,
    ) -> Result<Option<Value>, SocketError> {
        if let EventError::Handler(cause) = &err {
            log_handler_error!(event_name = %ctx.event(), error = %cause, "handler failed");
        }

        let disposition = match &self.error_handler {
            Some(handler) => handler(&err, ctx),
            None => ErrorDisposition::Raise,
        };
        match disposition {
            ErrorDisposition::Respond(ack) => Ok(ack),
            ErrorDisposition::Raise => Err(err.into()),
        }
    }

    /// Send an event to `sink`, validating documented shapes when validation is on.
    pub fn emit(
        &self,
        event: &str,
        payload: Value,
        sink: &dyn EventSink,
    ) -> Result<(), EmitValidationError> {
        if self.config.validate {
            if let Some(shape) = self.emits.get(event) {
                if let Err(mismatch) = shape.validate(&payload) {
                    log_contract_violation!(
                        event_name = %event,
                        shape = %mismatch.shape,
                        errors = mismatch.len(),
                        "emitted payload does not match its documented shape"
                    );
                    return Err(EmitValidationError {
                        event: event.to_string(),
                        mismatch,
                    });
                }
            }
        }
        sink.emit(event, payload);
        Ok(())
    }

    /// Whether a handler is registered for `event`.
    pub fn handles(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// The AsyncAPI document assembled so far.
    pub fn asyncapi_doc(&self) -> &SpecificationDocument {
        &self.doc
    }

    pub fn get_yaml(&self) -> Result<String, SpecError> {
        let yaml = self.doc.to_yaml()?;
        log_doc_rendered!(format = "yaml", bytes = yaml.len());
        Ok(yaml)
    }

    pub fn get_json(&self) -> Result<String, SpecError> {
        let json = self.doc.to_json_pretty()?;
        log_doc_rendered!(format = "json", bytes = json.len());
        Ok(json)
    }

    /// A client that dispatches straight into this socket and records what it receives.
    pub fn test_client(&self) -> TestClient<'_> {
        TestClient::new(self)
    }
}

impl Default for AsyncApiSocket {
    fn default() -> Self {
        Self::new(SocketConfig::default())
    }
}

fn decode_request<Req>(args: &EventArgs) -> Result<Req, RequestValidationError>
where
    Req: DeserializeOwned + Shape,
{
    let Some(request) = args.request() else {
        return Err(RequestValidationError(ShapeMismatch::new(
            Req::type_name(),
            vec![MismatchDetail {
                path: String::new(),
                message: "request payload is missing".to_string(),
            }],
        )));
    };
    serde_json::from_value(request.clone())
        .map_err(|e| RequestValidationError(ShapeMismatch::from_decode(Req::type_name(), &e)))
}
