use std::sync::Arc;

use clap::Parser;

use fire_config_mcp::config::{Cli, ServerConfig, Transport};
use fire_config_mcp::logging;
use fire_config_mcp::registry::EnvironmentRegistry;
use fire_config_mcp::{server, transport};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_cli(Cli::parse()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("fire-config-mcp: configuration error: {e}");
            std::process::exit(1);
        }
    };

    logging::init(config.verbose);

    let registry = match EnvironmentRegistry::load(&config) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let result = match config.transport {
        Transport::Sse => transport::serve(&config, registry)
            .await
            .map_err(|e| e.to_string()),
        Transport::Stdio => server::run_stdio(registry).await.map_err(|e| e.to_string()),
    };

    if let Err(e) = result {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}
