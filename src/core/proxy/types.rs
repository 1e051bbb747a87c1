// Core types for proxy resolution
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Port used when a configured proxy address carries no port
pub const DEFAULT_PROXY_PORT: u16 = 8080;

/// Protocol key for plain HTTP proxies
pub const PROTOCOL_HTTP: &str = "http";
/// Protocol key for HTTPS proxies
pub const PROTOCOL_HTTPS: &str = "https";

/// Normalized, platform-independent proxy configuration snapshot
///
/// Built in one shot by [`ProxyConfigResolver`](super::resolver::ProxyConfigResolver)
/// and never mutated afterwards. The default value is the inactive, empty
/// configuration that stands for "no proxy configured".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProxyConfig {
    is_static_active: bool,
    protocols: BTreeMap<String, String>,
    no_proxy: Option<String>,
    is_automatic_active: bool,
    pre_configured_url: Option<String>,
}

impl ProxyConfig {
    /// Create a static (manually configured) proxy configuration
    ///
    /// Protocol names are lowercased. Autodetect and PAC fields stay unset.
    pub fn new(
        is_static_active: bool,
        protocols: impl IntoIterator<Item = (String, String)>,
        no_proxy: Option<String>,
    ) -> Self {
        Self {
            is_static_active,
            protocols: protocols
                .into_iter()
                .map(|(protocol, address)| (protocol.to_lowercase(), address))
                .collect(),
            no_proxy,
            is_automatic_active: false,
            pre_configured_url: None,
        }
    }

    /// Inactive, empty configuration (direct connection)
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Whether a manually configured proxy is active
    pub fn is_static_active(&self) -> bool {
        self.is_static_active
    }

    /// Protocol name to raw `host[:port]` address
    pub fn protocols(&self) -> &BTreeMap<String, String> {
        &self.protocols
    }

    /// Raw address configured for a protocol, if any
    pub fn protocol(&self, protocol: &str) -> Option<&str> {
        self.protocols.get(protocol).map(String::as_str)
    }

    /// Raw bypass list, passed through untouched
    pub fn no_proxy(&self) -> Option<&str> {
        self.no_proxy.as_deref()
    }

    /// Reserved for autodetect mode; no source sets it
    pub fn is_automatic_active(&self) -> bool {
        self.is_automatic_active
    }

    /// Reserved for a PAC URL; no source sets it
    pub fn pre_configured_url(&self) -> Option<&str> {
        self.pre_configured_url.as_deref()
    }
}

impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let protocols = self
            .protocols
            .iter()
            .map(|(protocol, address)| format!("{}={}", protocol, address))
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "ProxyConfig{{isStaticActive={}, protocols={{{}}}, noProxy={}, isAutomaticActive={}, preConfiguredURL={}}}",
            self.is_static_active,
            protocols,
            self.no_proxy.as_deref().unwrap_or("null"),
            self.is_automatic_active,
            self.pre_configured_url.as_deref().unwrap_or("null"),
        )
    }
}

/// Kind of proxy an endpoint speaks. Only HTTP proxies are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum ProxyType {
    #[default]
    Http,
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "HTTP"),
        }
    }
}

/// The single proxy endpoint selected for outbound connections
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProxyEndpoint {
    pub proxy_type: ProxyType,
    pub host: String,
    pub port: u16,
}

impl ProxyEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            proxy_type: ProxyType::Http,
            host: host.into(),
            port,
        }
    }

    /// Proxy URL in the form expected by HTTP clients, e.g. `http://host:8080`
    pub fn to_proxy_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl std::str::FromStr for ProxyEndpoint {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::selector::parse_proxy_address(s)
    }
}

/// Raw, unnormalized reading returned by a platform proxy source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawProxyReading {
    /// Values of the per-user Internet Settings store (or its environment fallback)
    Registry {
        server: Option<String>,
        override_list: Option<String>,
        enabled: bool,
    },
    /// Values of `http_proxy`, `https_proxy` and `no_proxy`
    Environment {
        http: Option<String>,
        https: Option<String>,
        no_proxy: Option<String>,
    },
}

/// Proxy resolution and connection errors
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Platform source could not be read; recovered inside the resolver
    #[error("Proxy source read failed: {0}")]
    SourceRead(String),
    /// Configured address cannot be turned into an endpoint
    #[error("Malformed proxy address '{address}': {reason}")]
    MalformedAddress { address: String, reason: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

impl ProxyError {
    pub(crate) fn malformed(address: &str, reason: impl Into<String>) -> Self {
        ProxyError::MalformedAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}
