//! Rendering the document as YAML or JSON text.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::SpecError;
use crate::model::SpecificationDocument;

/// Output format of a rendered document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocFormat {
    #[default]
    Yaml,
    Json,
}

impl DocFormat {
    /// Guess the format from a file name; anything that is not `.json` is YAML.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl FromStr for DocFormat {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(SpecError::Unsupported(format!(
                "document format '{}' (expected yaml or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl SpecificationDocument {
    /// The document as a generic JSON value.
    pub fn to_value(&self) -> Result<Value, SpecError> {
        serde_json::to_value(self).map_err(|e| SpecError::Render(e.to_string()))
    }

    /// Block-style YAML, keys in document order.
    pub fn to_yaml(&self) -> Result<String, SpecError> {
        serde_yaml::to_string(self).map_err(|e| SpecError::Render(e.to_string()))
    }

    /// Compact JSON.
    pub fn to_json(&self) -> Result<String, SpecError> {
        serde_json::to_string(self).map_err(|e| SpecError::Render(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        serde_json::to_string_pretty(self).map_err(|e| SpecError::Render(e.to_string()))
    }

    /// Render in the given format. JSON output is pretty-printed.
    pub fn render(&self, format: DocFormat) -> Result<String, SpecError> {
        let text = match format {
            DocFormat::Yaml => self.to_yaml()?,
            DocFormat::Json => self.to_json_pretty()?,
        };
        tracing::debug!(%format, bytes = text.len(), "document rendered");
        Ok(text)
    }
}
