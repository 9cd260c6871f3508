use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Environment used when none is named on the command line.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Default timeout for requests to the Remote Config service (30 seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// HTTP server-sent events (`GET /mcp` + `POST /message`).
    Sse,
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
}

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "fire-config-mcp",
    version,
    about = "MCP server for Firebase Remote Config"
)]
pub struct Cli {
    /// Environments to load; each needs a serviceAccount_<env>.json key file
    pub envs: Vec<String>,

    /// Directory holding the service account key files
    #[arg(long, env = "FIRE_CONFIG_CREDENTIALS_DIR", default_value = ".")]
    pub credentials_dir: PathBuf,

    #[arg(long, env = "FIRE_CONFIG_TRANSPORT", value_enum, default_value = "sse")]
    pub transport: Transport,

    #[arg(long, env = "FIRE_CONFIG_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "FIRE_CONFIG_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Timeout in seconds for each request to the Remote Config service
    #[arg(long, env = "FIRE_CONFIG_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment names must not be empty")]
    EmptyEnvironmentName,
    #[error("request timeout must be a positive number of seconds")]
    InvalidTimeout,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Startup environment list, deduplicated, in command-line order.
    pub environments: Vec<String>,
    pub credentials_dir: PathBuf,
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub verbose: bool,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.envs.iter().any(|env| env.trim().is_empty()) {
            return Err(ConfigError::EmptyEnvironmentName);
        }
        if cli.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let mut environments: Vec<String> = Vec::with_capacity(cli.envs.len());
        for env in cli.envs {
            if !environments.contains(&env) {
                environments.push(env);
            }
        }
        if environments.is_empty() {
            environments.push(DEFAULT_ENVIRONMENT.to_string());
        }

        Ok(Self {
            environments,
            credentials_dir: cli.credentials_dir,
            transport: cli.transport,
            host: cli.host,
            port: cli.port,
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            verbose: cli.verbose,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
