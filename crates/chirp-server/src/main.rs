use anyhow::Result;
use tracing::info;

mod config;
mod db;
mod server;
mod telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init()?;

    info!("Chirp Server starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("License: AGPL-3.0");

    let config = config::ServerConfig::from_env();

    // Start the HTTP/WebSocket server
    server::start(config).await?;

    Ok(())
}
