pub mod loader;
pub mod types;

pub use loader::ENV_CONFIG_PATH;
pub use types::{Config, ConfigError, HttpSection, ProxySection};
