//! Proxy configuration resolution
//!
//! [`ProxyConfigResolver`] picks the platform source once, reads it and
//! normalizes the reading into a [`ProxyConfig`]. Resolution never fails:
//! an unreadable source is the same as no configuration at all.

use std::sync::Arc;

use crate::core::debug_logger::get_debug_logger;
use crate::core::proxy::registry::{RegistryReader, SystemRegistry};
use crate::core::proxy::source::{EnvReader, Platform, PlatformProxySource, ProcessEnv};
use crate::core::proxy::types::{ProxyConfig, RawProxyReading, PROTOCOL_HTTP, PROTOCOL_HTTPS};

/// Resolver behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// On Windows, read the proxy environment variables when the registry read fails
    pub registry_env_fallback: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            registry_env_fallback: true,
        }
    }
}

/// Resolves the ambient proxy configuration of the host
#[derive(Clone)]
pub struct ProxyConfigResolver {
    platform: Platform,
    env: Arc<dyn EnvReader>,
    registry: Arc<dyn RegistryReader>,
    options: ResolverOptions,
}

impl Default for ProxyConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyConfigResolver {
    /// Resolver for the running platform, reading the process environment and system registry
    pub fn new() -> Self {
        Self::for_platform(Platform::detect())
    }

    /// Resolver pinned to a platform
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            env: Arc::new(ProcessEnv),
            registry: Arc::new(SystemRegistry),
            options: ResolverOptions::default(),
        }
    }

    /// Configure resolver with custom environment reader (for testing)
    pub fn with_env(mut self, env: impl EnvReader + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Configure resolver with custom registry reader (for testing)
    pub fn with_registry(mut self, registry: impl RegistryReader + 'static) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The source matching the resolver's platform
    pub fn source(&self) -> PlatformProxySource<'_> {
        match self.platform {
            Platform::Windows => PlatformProxySource::Windows {
                registry: self.registry.as_ref(),
                env: self.env.as_ref(),
                env_fallback: self.options.registry_env_fallback,
            },
            Platform::Posix => PlatformProxySource::Posix {
                env: self.env.as_ref(),
            },
        }
    }

    /// Read and normalize the current proxy configuration
    ///
    /// Always returns a configuration; a source read failure yields
    /// [`ProxyConfig::inactive`].
    pub fn resolve(&self) -> ProxyConfig {
        let logger = get_debug_logger();
        let platform = match self.platform {
            Platform::Windows => "windows",
            Platform::Posix => "posix",
        };

        let config = match self.source().read() {
            Ok(reading) => normalize(reading),
            Err(e) => {
                logger.error_sync("ProxyConfigResolver", "source_read_failed", &e.to_string());
                ProxyConfig::inactive()
            }
        };

        let protocols: Vec<&str> = config.protocols().keys().map(String::as_str).collect();
        logger.config_resolved(platform, config.is_static_active(), &protocols);

        config
    }
}

fn normalize(reading: RawProxyReading) -> ProxyConfig {
    match reading {
        RawProxyReading::Registry {
            server,
            override_list,
            enabled,
        } => ProxyConfig::new(
            enabled,
            server.map(|server| (PROTOCOL_HTTP.to_string(), server)),
            override_list,
        ),
        RawProxyReading::Environment {
            http,
            https,
            no_proxy,
        } => {
            let active = http.is_some() || https.is_some();
            let protocols = http
                .map(|address| (PROTOCOL_HTTP.to_string(), address))
                .into_iter()
                .chain(https.map(|address| (PROTOCOL_HTTPS.to_string(), address)));
            ProxyConfig::new(active, protocols, no_proxy)
        }
    }
}
