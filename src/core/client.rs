/*!
Proxy-aware HTTP client context.

[`ProxyClient`] resolves the ambient proxy once when it is built and caches
the selected endpoint. Connection helpers apply the cached endpoint (or a
direct connection) to every request. The cache is replaced wholesale by
[`ProxyClient::refresh`] and [`ProxyClient::set_custom_endpoint`]; readers
always observe a complete old or new value, and the resolved configuration
is cached in the same snapshot as the endpoint selected from it.

## Dependencies

- `arc-swap`: lock-free replacement of the cached state
- `ureq`: blocking HTTP client behind the connection helpers (`http-client` feature)
- `url`: request URL validation
*/

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::Config;
use crate::core::debug_logger::get_debug_logger;
use crate::core::proxy::resolver::{ProxyConfigResolver, ResolverOptions};
use crate::core::proxy::selector::{parse_proxy_address, select, select_or_resolve};
use crate::core::proxy::types::{ProxyConfig, ProxyEndpoint, ProxyError};

/// Settings applied to outbound requests made by the connection helpers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Global per-request timeout in milliseconds
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: format!("tproxy/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Resolved configuration and the endpoint currently in use
#[derive(Debug, Clone, Default)]
struct CachedState {
    config: ProxyConfig,
    endpoint: Option<ProxyEndpoint>,
}

/// Caller-owned proxy context: resolve once, refresh on demand
pub struct ProxyClient {
    resolver: ProxyConfigResolver,
    state: ArcSwap<CachedState>,
    http: HttpSettings,
}

impl ProxyClient {
    /// Create client for the running platform
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::MalformedAddress` if the configured proxy address cannot be parsed.
    pub fn new() -> Result<Self, ProxyError> {
        Self::with_resolver(ProxyConfigResolver::new())
    }

    /// Create client resolving through a specific resolver
    pub fn with_resolver(resolver: ProxyConfigResolver) -> Result<Self, ProxyError> {
        let config = resolver.resolve();
        let endpoint = select(&config)?;
        Ok(Self::from_parts(resolver, config, endpoint, "initial"))
    }

    /// Create client from a loaded configuration file
    ///
    /// A `[proxy] custom` endpoint takes precedence over the ambient
    /// configuration until the next [`refresh`](Self::refresh); the ambient
    /// addresses are then not parsed, so a malformed ambient proxy cannot
    /// fail construction.
    pub fn from_config(config: &Config) -> Result<Self, ProxyError> {
        let resolver = ProxyConfigResolver::new().with_options(ResolverOptions {
            registry_env_fallback: config.proxy.registry_env_fallback,
        });
        let http = HttpSettings {
            timeout_ms: config.http.timeout_ms,
            user_agent: config.http.user_agent.clone(),
        };

        let client = match config.proxy.custom.as_deref() {
            Some(custom) => {
                let custom = parse_proxy_address(custom)?;
                let resolved = resolver.resolve();
                let endpoint = select_or_resolve(Some(custom), &resolver)?;
                Self::from_parts(resolver, resolved, endpoint, "custom")
            }
            None => Self::with_resolver(resolver)?,
        };

        Ok(client.with_http_settings(http))
    }

    fn from_parts(
        resolver: ProxyConfigResolver,
        config: ProxyConfig,
        endpoint: Option<ProxyEndpoint>,
        reason: &str,
    ) -> Self {
        get_debug_logger().endpoint_replaced(reason, endpoint.as_ref().map(|e| e.to_string()).as_deref());

        Self {
            resolver,
            state: ArcSwap::from_pointee(CachedState { config, endpoint }),
            http: HttpSettings::default(),
        }
    }

    pub fn with_http_settings(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }

    pub fn resolver(&self) -> &ProxyConfigResolver {
        &self.resolver
    }

    pub fn http_settings(&self) -> &HttpSettings {
        &self.http
    }

    /// Snapshot of the cached endpoint; `None` means direct connection
    pub fn current_endpoint(&self) -> Option<ProxyEndpoint> {
        self.state.load().endpoint.clone()
    }

    /// Configuration from the most recent resolution
    pub fn resolved_config(&self) -> ProxyConfig {
        self.state.load().config.clone()
    }

    /// Configuration and endpoint read from the same cached snapshot
    pub fn snapshot(&self) -> (ProxyConfig, Option<ProxyEndpoint>) {
        let state = self.state.load();
        (state.config.clone(), state.endpoint.clone())
    }

    /// Override the cached endpoint until the next refresh. `None` forces direct connections.
    pub fn set_custom_endpoint(&self, endpoint: Option<ProxyEndpoint>) {
        get_debug_logger().endpoint_replaced("custom", endpoint.as_ref().map(|e| e.to_string()).as_deref());
        self.state.rcu(|state| CachedState {
            config: state.config.clone(),
            endpoint: endpoint.clone(),
        });
    }

    /// Re-resolve the ambient configuration and replace the cached state
    ///
    /// The previous state is kept when selection fails.
    pub fn refresh(&self) -> Result<(), ProxyError> {
        let config = self.resolver.resolve();
        let endpoint = select(&config)?;
        get_debug_logger().endpoint_replaced("refresh", endpoint.as_ref().map(|e| e.to_string()).as_deref());
        self.state.store(Arc::new(CachedState { config, endpoint }));
        Ok(())
    }
}

#[cfg(feature = "http-client")]
mod connection {
    use std::io::Read;
    use std::time::Duration;

    use super::ProxyClient;
    use crate::core::proxy::types::ProxyError;

    impl ProxyClient {
        /// Agent bound to the endpoint cached at call time
        fn agent(&self) -> Result<ureq::Agent, ProxyError> {
            let proxy = match self.current_endpoint() {
                Some(endpoint) => Some(
                    ureq::Proxy::new(&endpoint.to_proxy_url())
                        .map_err(|e| ProxyError::Http(format!("Invalid proxy {}: {}", endpoint, e)))?,
                ),
                // Explicitly direct; ureq would otherwise consult the environment itself
                None => None,
            };

            let agent: ureq::Agent = ureq::Agent::config_builder()
                .proxy(proxy)
                .timeout_global(Some(Duration::from_millis(self.http.timeout_ms)))
                .http_status_as_error(false)
                .build()
                .into();
            Ok(agent)
        }

        /// Send a GET request through the cached endpoint
        ///
        /// Non-2xx responses are returned as responses, not errors.
        pub fn open_connection(
            &self,
            url: &str,
        ) -> Result<ureq::http::Response<ureq::Body>, ProxyError> {
            let parsed = url::Url::parse(url)
                .map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ProxyError::InvalidUrl(format!(
                    "{}: unsupported scheme '{}'",
                    url,
                    parsed.scheme()
                )));
            }

            self.agent()?
                .get(parsed.as_str())
                .header("User-Agent", &self.http.user_agent)
                .call()
                .map_err(|e| ProxyError::Http(format!("Request to {} failed: {}", url, e)))
        }

        /// Open a reader over the response body of a GET request
        pub fn open_stream(&self, url: &str) -> Result<impl Read, ProxyError> {
            Ok(self.open_connection(url)?.into_body().into_reader())
        }
    }
}
