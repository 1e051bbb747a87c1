//! Proxy Configuration Resolution Module
//!
//! This module turns the ambient proxy settings of the host into one effective endpoint:
//! - Platform sources: Internet Settings registry on Windows, proxy environment variables elsewhere
//! - Normalization into a protocol-agnostic `ProxyConfig`
//! - Endpoint selection with https-over-http precedence and `host[:port]` parsing

pub mod registry;
pub mod resolver;
pub mod selector;
pub mod source;
pub mod types;

// Re-export public API
pub use registry::{RegistryProxySettings, RegistryReader, SystemRegistry};
pub use resolver::{ProxyConfigResolver, ResolverOptions};
pub use selector::{parse_proxy_address, select, select_or_resolve};
pub use source::{EnvReader, MapEnv, Platform, PlatformProxySource, ProcessEnv};
pub use types::{
    ProxyConfig, ProxyEndpoint, ProxyError, ProxyType, RawProxyReading, DEFAULT_PROXY_PORT,
};
