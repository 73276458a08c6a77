//! Eval Hub Server - HTTP REST API for the evaluation hub
//!
//! Loads the layered configuration, installs JSON logging and serves until
//! SIGTERM or Ctrl+C.

use anyhow::Context;
use eval_hub::ConfigLoader;
use server::{init_tracing, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ConfigLoader::new()
        .load()
        .context("failed to load configuration")?;

    let log_level = config
        .service
        .as_ref()
        .map(|service| service.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_tracing(&log_level);

    // Start server
    let server = Server::new(config).context("failed to create server")?;
    if let Err(err) = server.run_until_signal().await {
        tracing::error!(error = %err, "server exited with error");
        return Err(err.into());
    }

    Ok(())
}
