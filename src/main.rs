//! Presence Server
//!
//! Binds the WebSocket listener and runs the shared world until Ctrl-C.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use presence::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::from_env()?;

    info!("Presence Server v{}", VERSION);
    info!("Tick interval: {:?}", config.world.tick.interval);
    info!(
        "Tick stop policy: {}, color cadence: {}",
        config.world.tick.stop_policy, config.world.tick.color_cadence
    );
    info!("Not-logged-in token: {:?}", config.world.gate.sentinel);

    let server = Arc::new(GameServer::new(config));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                signal_server.shutdown();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    server.run().await?;

    info!("Server stopped");
    Ok(())
}
