use serial_test::serial;
use tproxy::core::proxy::registry::RegistryProxySettings;
use tproxy::core::proxy::{MapEnv, Platform, ProxyConfigResolver, ResolverOptions};

use crate::common::{FailingRegistry, FixedRegistry, ProxyEnvGuard};

fn posix_resolver() -> ProxyConfigResolver {
    ProxyConfigResolver::for_platform(Platform::Posix)
}

#[test]
#[serial]
fn test_posix_unset_environment_is_inactive() {
    let _env = ProxyEnvGuard::new();

    let config = posix_resolver().resolve();

    assert!(!config.is_static_active());
    assert!(config.protocols().is_empty());
    assert_eq!(config.no_proxy(), None);
}

#[test]
#[serial]
fn test_posix_no_proxy_alone_does_not_activate() {
    let env = ProxyEnvGuard::new();
    env.set("no_proxy", "localhost,127.0.0.1");

    let config = posix_resolver().resolve();

    assert!(!config.is_static_active());
    assert!(config.protocols().is_empty());
    assert_eq!(config.no_proxy(), Some("localhost,127.0.0.1"));
}

#[test]
#[serial]
fn test_posix_reads_process_environment() {
    let env = ProxyEnvGuard::new();
    env.set("http_proxy", "a:1");
    env.set("https_proxy", "b:2");
    env.set("no_proxy", ".internal");

    let config = posix_resolver().resolve();

    assert!(config.is_static_active());
    assert_eq!(config.protocol("http"), Some("a:1"));
    assert_eq!(config.protocol("https"), Some("b:2"));
    assert_eq!(config.no_proxy(), Some(".internal"));
    assert!(!config.is_automatic_active());
    assert_eq!(config.pre_configured_url(), None);
}

#[test]
#[serial]
fn test_posix_only_https_set() {
    let env = ProxyEnvGuard::new();
    env.set("https_proxy", "proxy.example.com:9090");

    let config = posix_resolver().resolve();

    assert!(config.is_static_active());
    assert_eq!(config.protocols().len(), 1);
    assert_eq!(config.protocol("https"), Some("proxy.example.com:9090"));
}

#[test]
#[serial]
fn test_resolve_is_idempotent() {
    let env = ProxyEnvGuard::new();
    env.set("http_proxy", "proxy.local:3128");
    env.set("no_proxy", "localhost");

    let resolver = posix_resolver();
    assert_eq!(resolver.resolve(), resolver.resolve());
}

#[test]
fn test_windows_registry_values_are_normalized() {
    let resolver = ProxyConfigResolver::for_platform(Platform::Windows).with_registry(
        FixedRegistry(RegistryProxySettings {
            server: Some("corp-proxy:8888".to_string()),
            override_list: Some("*.corp;<local>".to_string()),
            enabled: true,
        }),
    );

    let config = resolver.resolve();

    assert!(config.is_static_active());
    assert_eq!(config.protocols().len(), 1);
    assert_eq!(config.protocol("http"), Some("corp-proxy:8888"));
    assert_eq!(config.no_proxy(), Some("*.corp;<local>"));
}

#[test]
fn test_windows_disabled_proxy_keeps_server_but_is_inactive() {
    let resolver = ProxyConfigResolver::for_platform(Platform::Windows).with_registry(
        FixedRegistry(RegistryProxySettings {
            server: Some("corp-proxy:8888".to_string()),
            override_list: None,
            enabled: false,
        }),
    );

    let config = resolver.resolve();

    assert!(!config.is_static_active());
    assert_eq!(config.protocol("http"), Some("corp-proxy:8888"));
    assert_eq!(tproxy::core::proxy::select(&config).unwrap(), None);
}

#[test]
fn test_windows_registry_failure_degrades_to_inactive() {
    let resolver = ProxyConfigResolver::for_platform(Platform::Windows)
        .with_registry(FailingRegistry)
        .with_env(MapEnv::new());

    let config = resolver.resolve();

    assert!(!config.is_static_active());
    assert!(config.protocols().is_empty());
}

#[test]
fn test_windows_registry_failure_without_fallback_ignores_environment() {
    let resolver = ProxyConfigResolver::for_platform(Platform::Windows)
        .with_registry(FailingRegistry)
        .with_env(MapEnv::new().with("http_proxy", "env-proxy:3128"))
        .with_options(ResolverOptions {
            registry_env_fallback: false,
        });

    let config = resolver.resolve();

    assert!(!config.is_static_active());
    assert!(config.protocols().is_empty());
    assert_eq!(config.no_proxy(), None);
}

#[test]
fn test_windows_registry_failure_falls_back_to_environment() {
    let resolver = ProxyConfigResolver::for_platform(Platform::Windows)
        .with_registry(FailingRegistry)
        .with_env(
            MapEnv::new()
                .with("https_proxy", "env-proxy:3128")
                .with("no_proxy", "localhost"),
        );

    let config = resolver.resolve();

    assert!(config.is_static_active());
    assert_eq!(config.protocol("http"), Some("env-proxy:3128"));
    assert_eq!(config.no_proxy(), Some("localhost"));
}

#[test]
fn test_resolver_reports_pinned_platform() {
    assert_eq!(
        ProxyConfigResolver::for_platform(Platform::Windows).platform(),
        Platform::Windows
    );
    assert_eq!(ProxyConfigResolver::new().platform(), Platform::detect());
}

#[cfg(not(windows))]
#[test]
#[serial]
fn test_top_level_helpers_use_process_environment() {
    use tproxy::{resolve_proxy, resolve_proxy_config};

    let env = ProxyEnvGuard::new();
    env.set("https_proxy", "proxy.example.com:9090");

    let config = resolve_proxy_config();
    assert!(config.is_static_active());

    let endpoint = resolve_proxy().unwrap().unwrap();
    assert_eq!(endpoint.host, "proxy.example.com");
    assert_eq!(endpoint.port, 9090);
}
