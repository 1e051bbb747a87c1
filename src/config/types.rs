use serde::{Deserialize, Serialize};

/// Configuration file contents (`~/.tproxy/config.toml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub proxy: ProxySection,
    pub http: HttpSection,
}

/// `[proxy]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySection {
    /// Fixed `host[:port]` endpoint that overrides the system configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    /// On Windows, read the proxy environment variables when the registry is unreadable
    pub registry_env_fallback: bool,
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            custom: None,
            registry_env_fallback: true,
        }
    }
}

/// `[http]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: format!("tproxy/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,
    #[error("Config read error: {0}")]
    ConfigRead(String),
    #[error("Config parse error: {0}")]
    ConfigParse(String),
    #[error("Config write error: {0}")]
    ConfigWrite(String),
    #[error("Invalid custom proxy: {0}")]
    InvalidCustomProxy(#[from] crate::core::proxy::types::ProxyError),
    #[error("Invalid http.timeout_ms: must be greater than 0")]
    InvalidTimeout,
}
