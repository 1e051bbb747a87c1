use std::fs;
use std::path::{Path, PathBuf};

use super::types::{Config, ConfigError};
use crate::core::proxy::selector::parse_proxy_address;

/// Overrides the configuration file location
pub const ENV_CONFIG_PATH: &str = "TPROXY_CONFIG";

impl Config {
    /// `$TPROXY_CONFIG`, or `~/.tproxy/config.toml`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(home.join(".tproxy").join("config.toml"))
    }

    /// Load the configuration file; a missing file yields the defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ConfigRead(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::ConfigParse(format!("{}: {}", path.display(), e)))
    }

    /// Write a default configuration file unless one already exists
    pub fn init() -> Result<PathBuf, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::ConfigWrite(format!("{}: {}", parent.display(), e)))?;
        }

        fs::write(path, self.to_toml()?)
            .map_err(|e| ConfigError::ConfigWrite(format!("{}: {}", path.display(), e)))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigWrite(e.to_string()))
    }

    /// Validate values that the loader cannot check by shape alone
    pub fn check(&self) -> Result<(), ConfigError> {
        if let Some(custom) = &self.proxy.custom {
            parse_proxy_address(custom)?;
        }
        if self.http.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn print(&self) -> Result<(), ConfigError> {
        println!("{}", self.to_toml()?);
        Ok(())
    }
}
