//! Effective endpoint selection
//!
//! Turns a [`ProxyConfig`] into the single HTTP proxy endpoint to use, or
//! `None` for a direct connection. The `https` entry wins over `http`
//! regardless of the scheme of the request that will use the endpoint.

use crate::core::debug_logger::get_debug_logger;
use crate::core::proxy::resolver::ProxyConfigResolver;
use crate::core::proxy::types::{
    ProxyConfig, ProxyEndpoint, ProxyError, DEFAULT_PROXY_PORT, PROTOCOL_HTTP, PROTOCOL_HTTPS,
};

/// Select the effective proxy endpoint of a configuration
///
/// # Errors
///
/// Returns `ProxyError::MalformedAddress` when the preferred address has an
/// empty host or a port that is not a number in `0..=65535`.
pub fn select(config: &ProxyConfig) -> Result<Option<ProxyEndpoint>, ProxyError> {
    if !config.is_static_active() || config.protocols().is_empty() {
        get_debug_logger().endpoint_selected(None, None);
        return Ok(None);
    }

    let (protocol, address) = match config
        .protocol(PROTOCOL_HTTPS)
        .map(|address| (PROTOCOL_HTTPS, address))
        .or_else(|| config.protocol(PROTOCOL_HTTP).map(|address| (PROTOCOL_HTTP, address)))
    {
        Some(entry) => entry,
        None => {
            // Only protocols other than http/https were reported
            get_debug_logger().endpoint_selected(None, None);
            return Ok(None);
        }
    };

    let endpoint = parse_proxy_address(address)?;
    get_debug_logger().endpoint_selected(Some(protocol), Some(&endpoint.to_string()));
    Ok(Some(endpoint))
}

/// Use `explicit` when given, otherwise resolve the ambient configuration and select from it
pub fn select_or_resolve(
    explicit: Option<ProxyEndpoint>,
    resolver: &ProxyConfigResolver,
) -> Result<Option<ProxyEndpoint>, ProxyError> {
    match explicit {
        Some(endpoint) => Ok(Some(endpoint)),
        None => select(&resolver.resolve()),
    }
}

/// Parse a raw `host[:port]` proxy address
///
/// A leading `http://` or `https://` and a trailing `/` are ignored. The
/// address is split on its first colon; a missing or empty port means
/// [`DEFAULT_PROXY_PORT`].
pub fn parse_proxy_address(address: &str) -> Result<ProxyEndpoint, ProxyError> {
    let trimmed = address.trim();
    let without_scheme = strip_scheme(trimmed);
    let authority = without_scheme.strip_suffix('/').unwrap_or(without_scheme);

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };

    if host.is_empty() {
        return Err(ProxyError::malformed(address, "missing host"));
    }

    let port = match port {
        None | Some("") => DEFAULT_PROXY_PORT,
        Some(port) => port
            .parse::<u16>()
            .map_err(|e| ProxyError::malformed(address, format!("invalid port '{}': {}", port, e)))?,
    };

    Ok(ProxyEndpoint::new(host, port))
}

fn strip_scheme(address: &str) -> &str {
    for scheme in ["http://", "https://"] {
        match address.get(..scheme.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(scheme) => return &address[scheme.len()..],
            _ => {}
        }
    }
    address
}
