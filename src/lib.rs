//! Resolve the system proxy configuration and apply it to outbound HTTP(S) requests.
//!
//! ```no_run
//! use tproxy::ProxyClient;
//!
//! let client = ProxyClient::new()?;
//! match client.current_endpoint() {
//!     Some(endpoint) => println!("via proxy {}", endpoint),
//!     None => println!("direct"),
//! }
//! # Ok::<(), tproxy::ProxyError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;

pub use crate::core::{
    HttpSettings, Platform, ProxyClient, ProxyConfig, ProxyConfigResolver, ProxyEndpoint,
    ProxyError, ProxyType,
};

/// Resolve the proxy configuration of the running platform
pub fn resolve_proxy_config() -> ProxyConfig {
    ProxyConfigResolver::new().resolve()
}

/// Resolve and select the effective proxy endpoint of the running platform
///
/// `Ok(None)` means connect directly.
pub fn resolve_proxy() -> Result<Option<ProxyEndpoint>, ProxyError> {
    crate::core::proxy::select(&resolve_proxy_config())
}
