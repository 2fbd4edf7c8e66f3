use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::SpecError;
use crate::model::{SpecificationDocument, ASYNCAPI_VERSION};
use crate::schema::{collect_refs, MESSAGES_PREFIX, SCHEMAS_PREFIX};

/// Parse a rendered document from a YAML or JSON string.
pub fn parse_document(input: &str) -> Result<SpecificationDocument, SpecError> {
    // JSON is valid YAML, one parser covers both
    let root: Value =
        serde_yaml::from_str(input).map_err(|e| SpecError::ParseError(e.to_string()))?;
    document_from_value(root)
}

fn document_from_value(root: Value) -> Result<SpecificationDocument, SpecError> {
    let root_obj = root
        .as_object()
        .ok_or_else(|| SpecError::ParseError("document root must be an object".into()))?;

    match root_obj.get("asyncapi").and_then(Value::as_str) {
        Some(ASYNCAPI_VERSION) => {}
        Some(other) => {
            return Err(SpecError::Unsupported(format!(
                "asyncapi version {} (expected {})",
                other, ASYNCAPI_VERSION
            )))
        }
        None => return Err(SpecError::Unsupported("missing 'asyncapi' field".into())),
    }

    serde_json::from_value(root).map_err(|e| SpecError::ParseError(e.to_string()))
}

/// Parse a document from a file path.
pub fn parse_document_file(path: &std::path::Path) -> Result<SpecificationDocument, SpecError> {
    let content = std::fs::read_to_string(path)?;
    parse_document(&content)
}

impl SpecificationDocument {
    /// Load a document from YAML text.
    pub fn from_yaml(input: &str) -> Result<Self, SpecError> {
        parse_document(input)
    }

    /// Load a document from JSON text.
    pub fn from_json(input: &str) -> Result<Self, SpecError> {
        let root: Value =
            serde_json::from_str(input).map_err(|e| SpecError::ParseError(e.to_string()))?;
        document_from_value(root)
    }

    /// Check the document's referential integrity.
    ///
    /// Every `$ref` must point into `components/schemas` or
    /// `components/messages` and resolve, and every registered message must
    /// be referenced exactly once from the root channel's unions.
    pub fn verify(&self) -> Result<(), SpecError> {
        let root = self.to_value()?;

        let mut refs = Vec::new();
        collect_refs(&root, &mut refs);
        for path in refs {
            if !path.starts_with(SCHEMAS_PREFIX) && !path.starts_with(MESSAGES_PREFIX) {
                return Err(SpecError::RefOutsideComponents(path.to_string()));
            }
            // strip the leading '#', the rest is a JSON pointer
            if root.pointer(&path[1..]).is_none() {
                return Err(SpecError::UnresolvedRef(path.to_string()));
            }
        }

        let mut counts: BTreeMap<String, usize> = self
            .components
            .messages
            .keys()
            .map(|name| (name.clone(), 0))
            .collect();
        for reference in self
            .publish_messages()
            .iter()
            .chain(self.subscribe_messages())
        {
            if let Some(name) = reference.message_name() {
                *counts.entry(name).or_default() += 1;
            }
        }
        if let Some((name, count)) = counts.into_iter().find(|(_, count)| *count != 1) {
            return Err(SpecError::MessageReferenceCount { name, count });
        }

        tracing::debug!(
            messages = self.components.messages.len(),
            schemas = self.components.schemas.len(),
            "document verified"
        );
        Ok(())
    }
}
