use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "tproxy")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Inspect and use the system proxy configuration")]
pub struct Cli {
    /// Print the result as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Use this proxy endpoint (host[:port]) instead of the system configuration
    #[arg(short = 'p', long = "proxy", value_name = "HOST[:PORT]")]
    pub proxy: Option<String>,

    /// Send a GET request through the effective proxy
    #[arg(short = 'f', long = "fetch", value_name = "URL")]
    pub fetch: Option<String>,

    /// Write a default configuration file
    #[arg(long = "init")]
    pub init: bool,

    /// Validate the configuration file
    #[arg(long = "check")]
    pub check: bool,

    /// Print the effective configuration file contents
    #[arg(long = "print")]
    pub print: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
