use tproxy::cli::Cli;
use tproxy::config::Config;
use tproxy::core::ProxyClient;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    // Handle configuration commands
    if cli.init {
        let path = Config::init()?;
        println!("✓ Configuration at {}", path.display());
        return Ok(());
    }

    if cli.check {
        let config = Config::load()?;
        config.check()?;
        println!("✓ Configuration valid");
        return Ok(());
    }

    if cli.print {
        let config = Config::load().unwrap_or_default();
        config.print()?;
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {}; using default configuration", e);
        Config::default()
    });
    if let Some(proxy) = cli.proxy {
        config.proxy.custom = Some(proxy);
    }

    let client = ProxyClient::from_config(&config)?;
    let (proxy_config, endpoint) = client.snapshot();
    let source = if config.proxy.custom.is_some() {
        "custom"
    } else {
        "system"
    };

    if cli.json {
        let output = serde_json::json!({
            "config": proxy_config,
            "endpoint": endpoint,
            "endpoint_source": source,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", proxy_config);
        match &endpoint {
            Some(endpoint) => println!("Effective proxy ({}): {} {}", source, endpoint.proxy_type, endpoint),
            None => println!("Effective proxy: DIRECT"),
        }
    }

    if let Some(url) = cli.fetch {
        fetch(&client, &url)?;
    }

    Ok(())
}

#[cfg(feature = "http-client")]
fn fetch(client: &ProxyClient, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let response = client.open_connection(url)?;
    let status = response.status();
    let mut body = response.into_body().into_reader();
    let bytes = std::io::copy(&mut body, &mut std::io::sink())?;
    println!("GET {} → {} ({} bytes)", url, status, bytes);
    Ok(())
}

#[cfg(not(feature = "http-client"))]
fn fetch(_client: &ProxyClient, _url: &str) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("HTTP client feature is not enabled. Please install with --features http-client");
    std::process::exit(1);
}
