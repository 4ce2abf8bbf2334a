//! Configuration of the JSON-RPC endpoint and its documentation.

use serde::Deserialize;

/// Endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JsonRpcConfig {
    /// Base path of the dispatch endpoint; empty mounts it at `/`
    pub path: String,
    /// Maximum request body size in bytes (0 = unlimited)
    pub max_request_size: usize,
    pub docs: DocsConfig,
}

impl Default for JsonRpcConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            max_request_size: 1024 * 1024, // 1 MB
            docs: DocsConfig::default(),
        }
    }
}

impl JsonRpcConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_max_request_size(mut self, max_request_size: usize) -> Self {
        self.max_request_size = max_request_size;
        self
    }

    pub fn with_docs(mut self, docs: DocsConfig) -> Self {
        self.docs = docs;
        self
    }

    /// Base path without surrounding slashes
    pub fn base_path(&self) -> &str {
        self.path.trim_matches('/')
    }

    /// Route of the dispatch endpoint
    pub fn endpoint_path(&self) -> String {
        format!("/{}", self.base_path())
    }

    /// Documentation path of a single method, `/<base>/json-rpc/<name>`
    pub fn method_path(&self, qualified_name: &str) -> String {
        match self.base_path() {
            "" => format!("/json-rpc/{}", qualified_name),
            base => format!("/{}/json-rpc/{}", base, qualified_name),
        }
    }
}

/// Documentation export configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub enabled: bool,
    /// Route serving the generated document
    pub path: String,
    pub title: String,
    pub version: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/v2/api-docs".to_string(),
            title: "Api Documentation".to_string(),
            version: "1.0".to_string(),
        }
    }
}

impl DocsConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Route of the documentation endpoint, always with a leading slash
    pub fn route(&self) -> String {
        format!("/{}", self.path.trim_matches('/'))
    }
}
