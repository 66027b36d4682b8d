//! Gridlock multiplayer game server.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gridlock_server::server::{self, ServerState};
use gridlock_server::{Hub, Outbox, ServerConfig, HUB_INBOX_CAPACITY};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!("Starting Gridlock server...");
    if let Some(timeout) = config.idle_timeout {
        info!("Idle lobbies close after {:?}", timeout);
    }

    let outbox = Arc::new(Outbox::new());
    let (hub_tx, hub_rx) = mpsc::channel(HUB_INBOX_CAPACITY);
    let hub = Hub::new(Arc::clone(&outbox), config.idle_timeout);
    tokio::spawn(hub.run(hub_rx, config.sweep_interval));

    server::run_server(config.addr, ServerState::new(outbox, hub_tx)).await
}
