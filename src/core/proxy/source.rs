//! Platform proxy sources
//!
//! A [`PlatformProxySource`] reads the raw, unnormalized proxy settings of one
//! operating system family. The set is closed: Windows reads the Internet
//! Settings registry store, everything else reads the conventional lowercase
//! proxy environment variables.

use std::collections::HashMap;
use std::env;

use crate::core::debug_logger::get_debug_logger;
use crate::core::proxy::registry::RegistryReader;
use crate::core::proxy::types::{ProxyError, RawProxyReading};

pub const ENV_HTTP_PROXY: &str = "http_proxy";
pub const ENV_HTTPS_PROXY: &str = "https_proxy";
pub const ENV_NO_PROXY: &str = "no_proxy";

/// Environment abstraction for dependency injection and testing
///
/// Implementations return `None` for unset variables. Empty values are
/// normalized away by the source, not by the reader.
pub trait EnvReader: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(_)) => {
                get_debug_logger().debug_sync(
                    "EnvReader",
                    "env_not_unicode",
                    &format!("Ignoring non-Unicode value of {}", key),
                );
                None
            }
        }
    }
}

/// Fixed set of variables, e.g. a captured environment
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvReader for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Host operating system family, as far as proxy discovery is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    /// Platform of the running process
    pub fn detect() -> Self {
        Self::from_os_name(env::consts::OS)
    }

    /// Any OS name containing "win" (case-insensitive) is Windows; all others are POSIX
    pub fn from_os_name(os_name: &str) -> Self {
        if os_name.to_lowercase().contains("win") {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

/// Reader for the raw proxy settings of one platform
pub enum PlatformProxySource<'a> {
    Windows {
        registry: &'a dyn RegistryReader,
        env: &'a dyn EnvReader,
        /// Fall back to the environment when the registry cannot be read
        env_fallback: bool,
    },
    Posix {
        env: &'a dyn EnvReader,
    },
}

impl PlatformProxySource<'_> {
    pub fn platform(&self) -> Platform {
        match self {
            PlatformProxySource::Windows { .. } => Platform::Windows,
            PlatformProxySource::Posix { .. } => Platform::Posix,
        }
    }

    /// Read raw settings. Only the Windows variant can fail, and only with the
    /// environment fallback disabled.
    pub fn read(&self) -> Result<RawProxyReading, ProxyError> {
        match self {
            PlatformProxySource::Posix { env } => Ok(read_environment(*env)),
            PlatformProxySource::Windows {
                registry,
                env,
                env_fallback,
            } => match registry.read_proxy_settings() {
                Ok(settings) => Ok(RawProxyReading::Registry {
                    server: settings.server,
                    override_list: settings.override_list,
                    enabled: settings.enabled,
                }),
                Err(e) if *env_fallback => {
                    get_debug_logger().debug_sync(
                        "PlatformProxySource",
                        "registry_fallback",
                        &format!("{}; falling back to environment", e),
                    );
                    Ok(registry_from_environment(*env))
                }
                Err(e) => Err(e),
            },
        }
    }
}

fn env_value(env: &dyn EnvReader, key: &str) -> Option<String> {
    env.var(key).filter(|value| !value.trim().is_empty())
}

fn read_environment(env: &dyn EnvReader) -> RawProxyReading {
    RawProxyReading::Environment {
        http: env_value(env, ENV_HTTP_PROXY),
        https: env_value(env, ENV_HTTPS_PROXY),
        no_proxy: env_value(env, ENV_NO_PROXY),
    }
}

/// Registry-shaped reading built from the proxy environment variables
fn registry_from_environment(env: &dyn EnvReader) -> RawProxyReading {
    let http = env_value(env, ENV_HTTP_PROXY);
    let https = env_value(env, ENV_HTTPS_PROXY);
    let enabled = http.is_some() || https.is_some();

    RawProxyReading::Registry {
        server: http.or(https),
        override_list: env_value(env, ENV_NO_PROXY),
        enabled,
    }
}
