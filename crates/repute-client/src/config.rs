//! Client configuration types.

use repute_core::{ReputeError, Result, DEFAULT_APPLICATION, DEFAULT_SCHEME, DISCOVERY_TEMPLATE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by every query made through one client.
///
/// All fields have defaults, so a TOML document only needs the keys it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Value of the `{scheme}` template parameter
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Value of the `{application}` template parameter
    #[serde(default = "default_application")]
    pub application: String,

    /// Template used to locate a service's query template
    #[serde(default = "default_discovery_template")]
    pub discovery_template: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds (default: none)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Most idle transports kept for reuse (default: unbounded)
    #[serde(default)]
    pub max_idle: Option<usize>,

    /// Largest response body accepted, in bytes (default: unbounded)
    #[serde(default)]
    pub max_response_bytes: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            application: default_application(),
            discovery_template: default_discovery_template(),
            user_agent: default_user_agent(),
            timeout_secs: None,
            max_idle: None,
            max_response_bytes: None,
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ReputeError::Config(e.to_string()))
    }

    /// Request timeout, if one is configured
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

// Default value functions for serde.
fn default_scheme() -> String {
    String::from(DEFAULT_SCHEME)
}

fn default_application() -> String {
    String::from(DEFAULT_APPLICATION)
}

fn default_discovery_template() -> String {
    String::from(DISCOVERY_TEMPLATE)
}

fn default_user_agent() -> String {
    format!("repute-rust/{}", env!("CARGO_PKG_VERSION"))
}
