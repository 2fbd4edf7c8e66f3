use thiserror::Error;

/// Errors produced while assembling, parsing or verifying a document (E2001–E2007).
#[derive(Debug, Error)]
pub enum SpecError {
    /// E2001: A message name is already taken by a different definition.
    #[error("E2001: message '{0}' is already registered with a different definition")]
    DuplicateMessageName(String),

    /// E2002: A schema name is already taken by a different definition.
    #[error("E2002: schema '{0}' is already registered with a different definition")]
    SchemaConflict(String),

    /// E2003: A `$ref` does not resolve inside the document.
    #[error("E2003: unresolved $ref: {0}")]
    UnresolvedRef(String),

    /// E2004: A `$ref` points outside `components/schemas` or `components/messages`.
    #[error("E2004: $ref outside components: {0}")]
    RefOutsideComponents(String),

    /// E2005: A message is not referenced exactly once from the channel unions.
    #[error("E2005: message '{name}' is referenced {count} time(s) from channel '/', expected 1")]
    MessageReferenceCount { name: String, count: usize },

    /// E2006: YAML/JSON parse error.
    #[error("E2006: parse error: {0}")]
    ParseError(String),

    /// E2007: Document is not an AsyncAPI 2.5.0 document of the supported shape.
    #[error("E2007: unsupported document: {0}")]
    Unsupported(String),

    /// The document could not be rendered.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error reading a document file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
