//! Homestead gateway binary

use anyhow::{bail, Result};
use homestead_server::{config::validate_config, telemetry, Server, ServerConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    telemetry::init(&config.logging)?;

    if let Err(errors) = validate_config(&config) {
        for err in &errors {
            error!(error = %err, "Invalid configuration");
        }
        bail!("configuration has {} error(s)", errors.len());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Homestead gateway"
    );

    // Create and run server
    let server = Server::new(config)?;
    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}
