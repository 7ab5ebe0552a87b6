//! Search configuration

use serde::{Deserialize, Serialize};

/// Search handle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Namespace prefixing every key of this index
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Name of the free-text field; every other field is matched by exact value
    #[serde(default = "default_text_field")]
    pub text_field: String,

    /// First rank returned when a query gives no window
    #[serde(default)]
    pub default_start: isize,

    /// Last rank returned when a query gives no window (-1 = last element)
    #[serde(default = "default_stop")]
    pub default_stop: isize,

    /// Record Prometheus metrics for search operations
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            text_field: default_text_field(),
            default_start: 0,
            default_stop: default_stop(),
            metrics_enabled: true,
        }
    }
}

fn default_namespace() -> String {
    "search".to_string()
}

fn default_text_field() -> String {
    "content".to_string()
}

fn default_stop() -> isize {
    -1
}

fn default_true() -> bool {
    true
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn text_field(mut self, field: impl Into<String>) -> Self {
        self.config.text_field = field.into();
        self
    }

    pub fn default_window(mut self, start: isize, stop: isize) -> Self {
        self.config.default_start = start;
        self.config.default_stop = stop;
        self
    }

    pub fn metrics_enabled(mut self, enabled: bool) -> Self {
        self.config.metrics_enabled = enabled;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
