use clap::Parser;
use std::path::PathBuf;

/// Conversational agent orchestration service
#[derive(Parser, Debug, Clone)]
#[command(name = "concierge", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "CONCIERGE_CONFIG", default_value = "concierge.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "CONCIERGE_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "CONCIERGE_PORT")]
    pub port: Option<u16>,

    /// Log level filter used when RUST_LOG is unset (e.g. "info", "concierge=debug")
    #[arg(long, env = "CONCIERGE_LOG")]
    pub log_level: Option<String>,
}
