//! Windows Internet Settings access
//!
//! The resolver depends only on the three-field [`RegistryProxySettings`] shape.
//! [`SystemRegistry`] is the production reader: it binds to the per-user
//! registry on Windows and reports a read failure everywhere else.

use crate::core::proxy::types::ProxyError;

/// Registry key holding the per-user proxy settings (under HKEY_CURRENT_USER)
pub const INTERNET_SETTINGS_KEY: &str =
    "Software\\Microsoft\\Windows\\CurrentVersion\\Internet Settings";
pub const VALUE_PROXY_SERVER: &str = "ProxyServer";
pub const VALUE_PROXY_OVERRIDE: &str = "ProxyOverride";
pub const VALUE_PROXY_ENABLE: &str = "ProxyEnable";

/// Raw proxy values read from the Internet Settings store
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryProxySettings {
    /// `ProxyServer`, possibly a `protocol=address;...` composite
    pub server: Option<String>,
    /// `ProxyOverride` bypass list
    pub override_list: Option<String>,
    /// `ProxyEnable == 1`
    pub enabled: bool,
}

/// Registry abstraction for dependency injection and testing
pub trait RegistryReader: Send + Sync {
    /// Read all three proxy values. Failing to read any one of them fails the whole read.
    fn read_proxy_settings(&self) -> Result<RegistryProxySettings, ProxyError>;
}

/// Production registry reader
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRegistry;

#[cfg(windows)]
impl RegistryReader for SystemRegistry {
    fn read_proxy_settings(&self) -> Result<RegistryProxySettings, ProxyError> {
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::RegKey;

        let read_err = |value: &str, e: std::io::Error| {
            ProxyError::SourceRead(format!("{}\\{}: {}", INTERNET_SETTINGS_KEY, value, e))
        };

        let settings = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey(INTERNET_SETTINGS_KEY)
            .map_err(|e| ProxyError::SourceRead(format!("{}: {}", INTERNET_SETTINGS_KEY, e)))?;

        let server: String = settings
            .get_value(VALUE_PROXY_SERVER)
            .map_err(|e| read_err(VALUE_PROXY_SERVER, e))?;
        let override_list: String = settings
            .get_value(VALUE_PROXY_OVERRIDE)
            .map_err(|e| read_err(VALUE_PROXY_OVERRIDE, e))?;
        let enabled: u32 = settings
            .get_value(VALUE_PROXY_ENABLE)
            .map_err(|e| read_err(VALUE_PROXY_ENABLE, e))?;

        Ok(RegistryProxySettings {
            server: non_empty(server),
            override_list: non_empty(override_list),
            enabled: enabled == 1,
        })
    }
}

#[cfg(not(windows))]
impl RegistryReader for SystemRegistry {
    fn read_proxy_settings(&self) -> Result<RegistryProxySettings, ProxyError> {
        Err(ProxyError::SourceRead(format!(
            "registry unavailable on {}",
            std::env::consts::OS
        )))
    }
}

#[cfg(windows)]
fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
