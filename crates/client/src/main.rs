//! EO Client - headless Endless Online protocol client
//!
//! Connects to a server, completes the init handshake and keeps the local
//! data files in sync with what the server advertises.

use anyhow::{Context, Result};
use eoclient_config::ClientConfig;
use eoclient_core::MapId;
use eoclient_data::DataRepositories;
use eoclient_network::{Client, ConnectionEvent, FileTransferHandlers, HandlerRegistry};
use eoclient_protocol::{InitFileType, LockerEvent, WelcomeFileInfo, LOCKER_KEYS};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const PUB_FILES: [InitFileType; 4] = [
    InitFileType::Item,
    InitFileType::Npc,
    InitFileType::Spell,
    InitFileType::Class,
];

#[tokio::main]
async fn main() -> Result<()> {
    let config = ClientConfig::load_default().context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("EO client starting up");
    config.display();

    let repositories = Arc::new(DataRepositories::new(&config.data_dir));
    repositories
        .load_from_disk()
        .with_context(|| format!("Failed to read data directory {}", config.data_dir.display()))?;

    let registry = Arc::new(HandlerRegistry::new());
    let files = FileTransferHandlers::new(Arc::clone(&repositories));
    files.register(&registry);
    let mut welcomes = files.subscribe_welcome();
    register_locker_logging(&registry);

    let client = Client::new(config.to_network_config(), Arc::clone(&registry));
    let mut events = client.subscribe();

    client.connect().await.context("Failed to connect")?;
    info!("Connected; waiting for server traffic (Ctrl-C to quit)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                client.disconnect().await;
                files.flush().await;
                return Ok(());
            }
            Ok(welcome) = welcomes.recv() => {
                if let Err(e) = request_stale_files(&client, &files, &welcome) {
                    warn!("Failed to request data files: {}", e);
                }
            }
            event = events.recv() => match event {
                Ok(ConnectionEvent::ConnectionLost(reason)) => {
                    error!("Connection lost: {}", reason);
                    anyhow::bail!("connection lost: {}", reason);
                }
                Ok(ConnectionEvent::StateChanged(state)) => info!("State: {}", state),
                Err(e) => warn!("Missed connection events: {}", e),
            },
        }
    }
}

/// Ask for every file the local copy is missing or outdated
fn request_stale_files(
    client: &Client,
    files: &FileTransferHandlers,
    welcome: &WelcomeFileInfo,
) -> eoclient_core::Result<()> {
    let repositories = files.repositories();

    for file_type in PUB_FILES {
        if repositories.needs_file(file_type, None) {
            client.request_file(file_type, welcome.session_id, None)?;
        }
    }

    let map_id: MapId = welcome.map_id;
    if repositories.needs_file(InitFileType::Map, Some(map_id)) {
        files.expect_map(map_id);
        client.request_file(InitFileType::Map, welcome.session_id, Some(map_id))?;
    }
    Ok(())
}

fn register_locker_logging(registry: &HandlerRegistry) {
    for key in LOCKER_KEYS {
        registry.register_function(key, |frame| {
            match LockerEvent::translate(frame)? {
                LockerEvent::Opened(opened) => {
                    info!("Locker at ({}, {}) holds {} item(s)", opened.x, opened.y, opened.items.len())
                }
                LockerEvent::ItemsChanged(changed) => info!(
                    "Locker item {} -> {} (weight {}/{})",
                    changed.item_id, changed.amount, changed.weight, changed.max_weight
                ),
                LockerEvent::Upgraded(upgraded) => info!(
                    "Locker upgraded to level {} ({} gold left)",
                    upgraded.upgrades, upgraded.gold_remaining
                ),
            }
            Ok(())
        });
    }
}
