//! Socket configuration.

use sioapi_spec::DEFAULT_PROTOCOL;

/// Configuration of an [`AsyncApiSocket`](crate::AsyncApiSocket).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    /// Validate requests, replies and documented emits (default: false).
    pub validate: bool,

    /// Record every registration in the AsyncAPI document (default: true).
    pub generate_docs: bool,

    /// API version shown in `info.version` (default: "1.0.0").
    pub version: String,

    /// Document title (default: "Demo Chat API").
    pub title: String,

    /// Document description; a fixed disclaimer is appended.
    pub description: String,

    /// URL of the documented server (default: "http://localhost:5000").
    pub server_url: String,

    /// Key of the server entry (default: "BACKEND").
    pub server_name: String,

    /// Server protocol (default: "socketio").
    pub server_protocol: String,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            validate: false,
            generate_docs: true,
            version: "1.0.0".to_string(),
            title: "Demo Chat API".to_string(),
            description: "Demo Chat API".to_string(),
            server_url: "http://localhost:5000".to_string(),
            server_name: "BACKEND".to_string(),
            server_protocol: DEFAULT_PROTOCOL.to_string(),
        }
    }
}

impl SocketConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_docs(mut self, generate_docs: bool) -> Self {
        self.generate_docs = generate_docs;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the server entry (URL and key).
    pub fn with_server(mut self, url: impl Into<String>, name: impl Into<String>) -> Self {
        self.server_url = url.into();
        self.server_name = name.into();
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.server_protocol = protocol.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SocketConfig::default();
        assert!(!config.validate);
        assert!(config.generate_docs);
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.title, "Demo Chat API");
        assert_eq!(config.description, "Demo Chat API");
        assert_eq!(config.server_url, "http://localhost:5000");
        assert_eq!(config.server_name, "BACKEND");
        assert_eq!(config.server_protocol, "socketio");
    }

    #[test]
    fn test_config_builder() {
        let config = SocketConfig::new()
            .with_validation(true)
            .with_docs(false)
            .with_version("2.0.0")
            .with_title("Downloader API")
            .with_description("Server downloader API")
            .with_server("http://localhost:5000", "DOWNLOADER_BACKEND")
            .with_protocol("wss");

        assert!(config.validate);
        assert!(!config.generate_docs);
        assert_eq!(config.version, "2.0.0");
        assert_eq!(config.title, "Downloader API");
        assert_eq!(config.description, "Server downloader API");
        assert_eq!(config.server_name, "DOWNLOADER_BACKEND");
        assert_eq!(config.server_protocol, "wss");
    }
}
