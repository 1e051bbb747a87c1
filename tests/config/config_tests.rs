use std::env;
use std::fs;

use serial_test::serial;
use tproxy::config::{Config, ConfigError, ENV_CONFIG_PATH};
use tproxy::ProxyClient;

use crate::common::{create_temp_dir, ProxyEnvGuard};

/// Points TPROXY_CONFIG at a path for the duration of a test
struct ConfigPathGuard {
    original: Option<String>,
}

impl ConfigPathGuard {
    fn new(path: &std::path::Path) -> Self {
        let original = env::var(ENV_CONFIG_PATH).ok();
        env::set_var(ENV_CONFIG_PATH, path);
        Self { original }
    }
}

impl Drop for ConfigPathGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => env::set_var(ENV_CONFIG_PATH, value),
            None => env::remove_var(ENV_CONFIG_PATH),
        }
    }
}

#[test]
#[serial]
fn test_init_writes_loadable_defaults() {
    let dir = create_temp_dir();
    let path = dir.path().join("nested").join("config.toml");
    let _guard = ConfigPathGuard::new(&path);

    let written = Config::init().expect("init should succeed");
    assert_eq!(written, path);
    assert!(path.exists());

    let loaded = Config::load().expect("load should succeed");
    assert_eq!(loaded, Config::default());
    loaded.check().expect("defaults should be valid");
}

#[test]
#[serial]
fn test_init_keeps_existing_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[http]\ntimeout_ms = 1234\n").unwrap();
    let _guard = ConfigPathGuard::new(&path);

    Config::init().unwrap();

    assert_eq!(Config::load().unwrap().http.timeout_ms, 1234);
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[proxy\ncustom = ").unwrap();

    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ConfigParse(_))
    ));
}

#[test]
fn test_check_rejects_malformed_custom_proxy() {
    let mut config = Config::default();
    config.proxy.custom = Some("proxy.corp:abc".to_string());

    assert!(matches!(
        config.check(),
        Err(ConfigError::InvalidCustomProxy(_))
    ));
}

#[test]
fn test_check_rejects_zero_timeout() {
    let mut config = Config::default();
    config.http.timeout_ms = 0;

    assert!(matches!(config.check(), Err(ConfigError::InvalidTimeout)));
}

#[test]
fn test_round_trip_through_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.proxy.custom = Some("proxy.corp:3128".to_string());
    config.proxy.registry_env_fallback = false;
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
#[serial]
fn test_client_from_config_applies_custom_proxy_and_http_settings() {
    let _env = ProxyEnvGuard::new();

    let mut config = Config::default();
    config.proxy.custom = Some("proxy.corp:3128".to_string());
    config.http.timeout_ms = 2_500;

    let client = ProxyClient::from_config(&config).expect("client should build");

    let endpoint = client.current_endpoint().expect("custom endpoint");
    assert_eq!(endpoint.host, "proxy.corp");
    assert_eq!(endpoint.port, 3128);
    assert_eq!(client.http_settings().timeout_ms, 2_500);
}

#[test]
#[serial]
#[cfg(not(windows))]
fn test_custom_proxy_overrides_malformed_ambient_proxy() {
    let env = ProxyEnvGuard::new();
    env.set("http_proxy", "ambient.proxy:bad");

    let mut config = Config::default();
    config.proxy.custom = Some("good.proxy:3128".to_string());

    let client = ProxyClient::from_config(&config).expect("custom proxy should win");

    let endpoint = client.current_endpoint().expect("custom endpoint");
    assert_eq!(endpoint.host, "good.proxy");
    assert_eq!(endpoint.port, 3128);
    assert_eq!(
        client.resolved_config().protocol("http"),
        Some("ambient.proxy:bad")
    );

    // Without an override the malformed ambient proxy still fails construction
    config.proxy.custom = None;
    assert!(matches!(
        ProxyClient::from_config(&config),
        Err(tproxy::ProxyError::MalformedAddress { .. })
    ));
}
