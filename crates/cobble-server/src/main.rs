mod config;
mod hooks;
mod network;
mod state;
mod tick;

use config::ServerConfig;
use state::ServerState;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Cobble server...");

    let config = Arc::new(ServerConfig::load(Path::new("config/server.toml"))?);
    info!(
        "Config loaded: bind={}:{}, max_players={}, level={}x{}x{}",
        config.bind,
        config.port,
        config.max_players,
        config.level_width,
        config.level_height,
        config.level_length
    );

    let level = cobble_world::generate_flat(
        &config.level_name,
        config.level_width,
        config.level_height,
        config.level_length,
    );
    let state = Arc::new(ServerState::new(config.clone(), level));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    // Graceful shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    tokio::select! {
        _ = tick::run_tick_loop(state.clone(), shutdown_rx) => {
            for player in state.players() {
                player.kick("Server shutting down");
            }
            info!(
                "Server shut down cleanly ({} connections still closing)",
                state.connection_count()
            );
        }
        _ = accept_loop(listener, state.clone()) => {
            error!("Accept loop exited unexpectedly");
        }
    }

    Ok(())
}

async fn accept_loop(listener: TcpListener, state: Arc<ServerState>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New connection from {}", peer);
                let state = state.clone();
                tokio::spawn(async move {
                    network::handle_connection(socket, state).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
