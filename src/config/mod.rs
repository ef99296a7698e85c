use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod validator;

use crate::cli::Cli;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub agents: AgentSettings,
    #[serde(default)]
    pub conversations: ConversationSettings,
    #[serde(default)]
    pub mcp: McpSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Tried in order when `port` cannot be bound
    #[serde(default = "default_fallback_ports")]
    pub fallback_ports: Vec<u16>,
    /// Advertised base URL; derived from host and the bound port when unset
    #[serde(default)]
    pub public_url: Option<String>,
}

fn default_fallback_ports() -> Vec<u16> {
    vec![3001, 3002, 3003]
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AgentSettings {
    /// Agent ids that discovery skips
    #[serde(default)]
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConversationSettings {
    /// Per-conversation retention cap, 0 for unlimited
    #[serde(default)]
    pub max_messages: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct McpSettings {
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
}

fn default_keep_alive_secs() -> u64 {
    15
}

fn default_session_buffer() -> usize {
    32
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            keep_alive_secs: default_keep_alive_secs(),
            session_buffer: default_session_buffer(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
                fallback_ports: default_fallback_ports(),
                public_url: None,
            },
            agents: AgentSettings::default(),
            conversations: ConversationSettings::default(),
            mcp: McpSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Load `concierge.*` from the working directory
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(cli.config.clone())?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let settings = Self::load(Path::new(root).join("concierge"))?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(config_path: PathBuf) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(level) = &cli.log_level {
            self.log.level = level.clone();
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    /// Configured port first, then each distinct fallback port
    pub fn candidate_ports(&self) -> Vec<u16> {
        let mut ports = vec![self.server.port];
        for port in &self.server.fallback_ports {
            if !ports.contains(port) {
                ports.push(*port);
            }
        }
        ports
    }

    /// Base URL the service is reachable at when bound to `self.server.port`
    pub fn base_url(&self) -> String {
        self.base_url_for_port(self.server.port)
    }

    pub fn base_url_for_port(&self, port: u16) -> String {
        match &self.server.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.server.host, port),
        }
    }
}
