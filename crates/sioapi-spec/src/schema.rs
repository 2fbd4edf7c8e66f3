//! Structural schemas and `$ref` handling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pointer prefix of every schema reference in the document.
pub const SCHEMAS_PREFIX: &str = "#/components/schemas/";

/// Pointer prefix of every message reference in the document.
pub const MESSAGES_PREFIX: &str = "#/components/messages/";

/// Name of the placeholder schema used when a handler declares no shape.
pub const NO_SPEC: &str = "NoSpec";

const REF_KEY: &str = "$ref";

/// Primitive JSON type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl PrimitiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }
}

/// A JSON-Schema-shaped description of a value.
///
/// Nested definitions are referenced by pointer (`{"$ref": "#/..."}`). Once
/// stored in a document, every pointer is rooted under
/// `#/components/schemas/<name>` so that it resolves against the document
/// rather than against the standalone schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralSchema(Value);

impl StructuralSchema {
    /// Wrap an already-built schema value.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// `{"type": <primitive>}`.
    pub fn primitive(ty: PrimitiveType) -> Self {
        Self(serde_json::json!({ "type": ty.as_str() }))
    }

    /// A type that also admits `null`, e.g. `{"type": ["array", "null"]}`.
    pub fn nullable(ty: PrimitiveType) -> Self {
        Self(serde_json::json!({ "type": [ty.as_str(), PrimitiveType::Null.as_str()] }))
    }

    /// An array whose elements follow `items`.
    pub fn array(items: StructuralSchema) -> Self {
        Self::primitive(PrimitiveType::Array).with_items(items)
    }

    /// An object with named fields; the boolean marks a field as required.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, StructuralSchema, bool)>,
        K: Into<String>,
    {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, schema, is_required) in fields {
            let name = name.into();
            if is_required {
                required.push(Value::String(name.clone()));
            }
            properties.insert(name, schema.0);
        }

        let mut obj = Map::new();
        obj.insert("type".into(), Value::String("object".into()));
        obj.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            obj.insert("required".into(), Value::Array(required));
        }
        Self(Value::Object(obj))
    }

    /// `{"$ref": <path>}`.
    pub fn reference(path: impl Into<String>) -> Self {
        Self(serde_json::json!({ "$ref": path.into() }))
    }

    /// Attach (or replace) a `description` keyword.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        if let Value::Object(obj) = &mut self.0 {
            obj.insert("description".into(), Value::String(description.into()));
        }
        self
    }

    /// Attach (or replace) the `items` keyword.
    pub fn with_items(mut self, items: StructuralSchema) -> Self {
        if let Value::Object(obj) = &mut self.0 {
            obj.insert("items".into(), items.0);
        }
        self
    }

    /// The placeholder schema stored under [`NO_SPEC`].
    pub fn no_spec() -> Self {
        Self(serde_json::json!({ "description": "Specification is not provided" }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Every `$ref` found anywhere in the schema tree.
    pub fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        collect_refs(&self.0, &mut refs);
        refs
    }

    /// Root every `$ref` in this schema under `prefix`. See [`rewrite_refs`].
    pub fn rewrite_refs(self, prefix: &str) -> Self {
        rewrite_refs(self, prefix)
    }
}

/// A pointer to another part of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub path: String,
}

impl Reference {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// `#/components/schemas/<name>`.
    pub fn schema(name: &str) -> Self {
        Self::new(format!("{}{}", SCHEMAS_PREFIX, escape_pointer_token(name)))
    }

    /// `#/components/messages/<name>`.
    pub fn message(name: &str) -> Self {
        Self::new(format!("{}{}", MESSAGES_PREFIX, escape_pointer_token(name)))
    }

    /// Reference to the [`NO_SPEC`] placeholder schema.
    pub fn no_spec() -> Self {
        Self::schema(NO_SPEC)
    }

    /// The message name this reference points at, if it targets `components/messages`.
    pub fn message_name(&self) -> Option<String> {
        self.path
            .strip_prefix(MESSAGES_PREFIX)
            .map(unescape_pointer_token)
    }
}

/// Rewrite every `$ref` in `schema` by inserting `prefix` right after the first `#`.
///
/// References at the top level, under nested objects and inside list elements
/// are all visited. A schema without references comes back unchanged.
pub fn rewrite_refs(schema: StructuralSchema, prefix: &str) -> StructuralSchema {
    let mut value = schema.0;
    rewrite_value(&mut value, prefix);
    StructuralSchema(value)
}

fn rewrite_value(value: &mut Value, prefix: &str) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj.iter_mut() {
                match child {
                    Value::String(path) if key == REF_KEY => {
                        *path = insert_prefix(path, prefix);
                    }
                    _ => rewrite_value(child, prefix),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_value(item, prefix);
            }
        }
        _ => {}
    }
}

/// Insert `prefix` after the first `#` of a pointer path.
pub fn insert_prefix(path: &str, prefix: &str) -> String {
    path.replacen('#', &format!("#{}", prefix), 1)
}

pub(crate) fn collect_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                match child {
                    Value::String(path) if key == REF_KEY => out.push(path),
                    _ => collect_refs(child, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, out);
            }
        }
        _ => {}
    }
}

/// Escape a single JSON pointer token (RFC 6901).
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

pub fn unescape_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
