//! Payload validation for sioapi event handlers.
//!
//! Compiles declared shapes into JSON Schema validators and wraps handlers in
//! a validation chain: the inbound request is checked before the handler runs
//! and its reply is checked after. Failures are raised as distinct error
//! kinds for the host's default error handler to route.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use sioapi_spec::{DocShape, Shape, ShapeDescriptor};
use sioapi_telemetry::{log_contract_violation, log_validation_failure};

/// A declared shape whose structural schema is not a valid JSON Schema.
#[derive(Debug, Error)]
#[error("invalid schema for shape '{shape}': {reason}")]
pub struct ShapeError {
    pub shape: String,
    pub reason: String,
}

/// One reason a value failed to match a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchDetail {
    /// Location of the offending value, `.`-separated; empty for the root.
    pub path: String,
    pub message: String,
}

/// A value did not conform to a shape.
///
/// Renders like `1 validation error for DownloadFileRequest`, followed by one
/// location/message pair per failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ShapeMismatch {
    pub shape: String,
    pub errors: Vec<MismatchDetail>,
}

impl ShapeMismatch {
    pub fn new(shape: impl Into<String>, errors: Vec<MismatchDetail>) -> Self {
        Self {
            shape: shape.into(),
            errors,
        }
    }

    /// A value passed schema validation but could not be decoded into its Rust type.
    pub fn from_decode(shape: impl Into<String>, err: &serde_json::Error) -> Self {
        Self::new(
            shape,
            vec![MismatchDetail {
                path: String::new(),
                message: err.to_string(),
            }],
        )
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.errors.len() == 1 { "" } else { "s" };
        write!(
            f,
            "{} validation error{} for {}",
            self.errors.len(),
            plural,
            self.shape
        )?;
        for detail in &self.errors {
            let path = if detail.path.is_empty() {
                "__root__"
            } else {
                &detail.path
            };
            write!(f, "\n{}\n  {}", path, detail.message)?;
        }
        Ok(())
    }
}

/// The inbound payload does not match the declared request shape.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct RequestValidationError(pub ShapeMismatch);

/// The handler's reply does not match the declared response shape.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ResponseValidationError(pub ShapeMismatch);

/// A documented outbound emission does not match its declared shape.
#[derive(Debug, Clone, Error)]
#[error("emit '{event}': {mismatch}")]
pub struct EmitValidationError {
    pub event: String,
    pub mismatch: ShapeMismatch,
}

/// Everything that can fail while handling one event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error(transparent)]
    Request(#[from] RequestValidationError),

    #[error(transparent)]
    Response(#[from] ResponseValidationError),

    #[error(transparent)]
    Emit(#[from] EmitValidationError),

    /// The handler itself failed.
    #[error("handler failed: {0:#}")]
    Handler(anyhow::Error),
}

impl EventError {
    /// Classify an error returned by a handler body.
    ///
    /// Validation errors raised inside the handler (typically an emit that
    /// failed its shape check) keep their kind instead of being folded into
    /// [`EventError::Handler`].
    pub fn from_handler(err: anyhow::Error) -> Self {
        let err = match err.downcast::<EmitValidationError>() {
            Ok(emit) => return Self::Emit(emit),
            Err(err) => err,
        };
        let err = match err.downcast::<RequestValidationError>() {
            Ok(request) => return Self::Request(request),
            Err(err) => err,
        };
        match err.downcast::<EventError>() {
            Ok(event) => event,
            Err(err) => Self::Handler(err),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "request_validation",
            Self::Response(_) => "response_validation",
            Self::Emit(_) => "emit_validation",
            Self::Handler(_) => "handler",
        }
    }

    /// Whether the failure was caused by the peer's input rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// The shape mismatch behind a validation error.
    pub fn mismatch(&self) -> Option<&ShapeMismatch> {
        match self {
            Self::Request(e) => Some(&e.0),
            Self::Response(e) => Some(&e.0),
            Self::Emit(e) => Some(&e.mismatch),
            Self::Handler(_) => None,
        }
    }
}

/// A shape compiled into a reusable validator.
pub struct CompiledShape {
    name: String,
    validator: jsonschema::Validator,
}

impl fmt::Debug for CompiledShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledShape")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CompiledShape {
    /// Compile a shape with format validation enabled.
    ///
    /// The schema is compiled standalone, so its internal `#/definitions/...`
    /// references resolve against itself.
    pub fn compile(descriptor: &ShapeDescriptor) -> Result<Self, ShapeError> {
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft7)
            .should_validate_formats(true)
            .build(descriptor.schema().as_value())
            .map_err(|e| ShapeError {
                shape: descriptor.name().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            name: descriptor.name().to_string(),
            validator,
        })
    }

    pub fn of<T: Shape>() -> Result<Self, ShapeError> {
        Self::compile(&ShapeDescriptor::of::<T>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check a value against the shape, collecting every failure.
    pub fn validate(&self, value: &Value) -> Result<(), ShapeMismatch> {
        let errors: Vec<MismatchDetail> = self
            .validator
            .iter_errors(value)
            .map(|e| MismatchDetail {
                path: pointer_to_path(&e.instance_path.to_string()),
                message: e.to_string(),
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ShapeMismatch::new(&self.name, errors))
        }
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value)
    }
}

/// `/data/is_accepted` becomes `data.is_accepted`.
fn pointer_to_path(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

/// The arguments an event arrived with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventArgs {
    pub positional: Vec<Value>,
    pub named: Map<String, Value>,
}

impl EventArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single positional payload.
    pub fn payload(value: Value) -> Self {
        Self {
            positional: vec![value],
            named: Map::new(),
        }
    }

    pub fn with_arg(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    pub fn with_named(mut self, name: impl Into<String>, value: Value) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    /// The request to validate: the first positional argument, else the
    /// `request` keyword. `null` counts as absent.
    pub fn request(&self) -> Option<&Value> {
        self.positional
            .first()
            .filter(|v| !v.is_null())
            .or_else(|| self.named.get("request").filter(|v| !v.is_null()))
    }
}

impl From<Value> for EventArgs {
    fn from(value: Value) -> Self {
        Self::payload(value)
    }
}

static NULL: Value = Value::Null;

/// What a handler returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Reply {
    /// No acknowledgement.
    #[default]
    None,
    /// A plain value, sent back as-is.
    Value(Value),
    /// A structured model, sent back as its JSON text.
    Model(Value),
}

impl Reply {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn model<T: Serialize>(model: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(model).map(Self::Model)
    }

    /// The value response validation runs against; `null` when there is none.
    pub fn payload(&self) -> &Value {
        match self {
            Self::None => &NULL,
            Self::Value(v) | Self::Model(v) => v,
        }
    }

    /// The acknowledgement handed back to the transport.
    pub fn into_ack(self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Value(v) => Some(v),
            Self::Model(v) => Some(Value::String(v.to_string())),
        }
    }
}

/// Request and response checks around one event handler.
#[derive(Debug, Clone)]
pub struct ValidationChain {
    event: String,
    request: Option<Arc<CompiledShape>>,
    response: Option<Arc<CompiledShape>>,
    enabled: bool,
}

impl ValidationChain {
    /// Compile the explicit shapes of a registration. `NotProvided` and
    /// absent shapes are documented only, never validated.
    pub fn from_shapes(
        event: impl Into<String>,
        request: &DocShape,
        response: &DocShape,
        enabled: bool,
    ) -> Result<Self, ShapeError> {
        let compile = |shape: &DocShape| -> Result<Option<Arc<CompiledShape>>, ShapeError> {
            shape
                .descriptor()
                .map(|d| CompiledShape::compile(d).map(Arc::new))
                .transpose()
        };
        Ok(Self {
            event: event.into(),
            request: compile(request)?,
            response: compile(response)?,
            enabled,
        })
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `handler` under this chain and return the acknowledgement.
    ///
    /// Without an extractable request the handler is called directly and
    /// nothing is validated. A request mismatch stops before the handler
    /// runs; a response mismatch is reported after it ran, its side
    /// effects stay in place.
    pub fn invoke<F>(&self, args: &EventArgs, handler: F) -> Result<Option<Value>, EventError>
    where
        F: FnOnce(&EventArgs) -> anyhow::Result<Reply>,
    {
        let Some(request) = args.request() else {
            let reply = handler(args).map_err(EventError::from_handler)?;
            return Ok(reply.into_ack());
        };

        if self.enabled {
            if let Some(shape) = &self.request {
                if let Err(mismatch) = shape.validate(request) {
                    log_validation_failure!(
                        event_name = %self.event,
                        shape = %mismatch.shape,
                        errors = mismatch.len(),
                        "inbound request rejected"
                    );
                    return Err(RequestValidationError(mismatch).into());
                }
            }
        }

        let reply = handler(args).map_err(EventError::from_handler)?;

        if self.enabled {
            if let Some(shape) = &self.response {
                if let Err(mismatch) = shape.validate(reply.payload()) {
                    log_contract_violation!(
                        event_name = %self.event,
                        shape = %mismatch.shape,
                        errors = mismatch.len(),
                        "handler reply does not match its response shape"
                    );
                    return Err(ResponseValidationError(mismatch).into());
                }
            }
        }

        Ok(reply.into_ack())
    }

    /// Bind a handler to this chain.
    pub fn wrap<H>(self, handler: H) -> ValidatedHandler<H>
    where
        H: Fn(&EventArgs) -> anyhow::Result<Reply>,
    {
        ValidatedHandler {
            chain: self,
            handler,
        }
    }
}

/// A handler bound to its validation chain.
pub struct ValidatedHandler<H> {
    chain: ValidationChain,
    handler: H,
}

impl<H> ValidatedHandler<H>
where
    H: Fn(&EventArgs) -> anyhow::Result<Reply>,
{
    pub fn call(&self, args: &EventArgs) -> Result<Option<Value>, EventError> {
        self.chain.invoke(args, &self.handler)
    }

    pub fn chain(&self) -> &ValidationChain {
        &self.chain
    }
}
