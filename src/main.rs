//! mute-automator daemon
//!
//! Hosts the automator against an in-memory host loaded from an inventory
//! file, and exposes it over a Unix domain socket:
//! - Settings apply/persist and manual scene reload for a settings UI
//! - Simulated scene switches and mute toggles
//! - Event notifications for subscribed clients
//!
//! On SIGINT/SIGTERM every managed device is restored before exit.

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mute_automator::dispatch::Dispatcher;
use mute_automator::host::Inventory;
use mute_automator::ipc::Server;
use mute_automator::lifecycle::ShutdownSignal;
use mute_automator::{Automator, AutomatorEvent, DaemonConfig, MemoryHost, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "mute-automator starting"
    );

    // Load configuration
    let config = DaemonConfig::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, ?config.settings_path, "configuration loaded");

    let settings = Settings::load_or_default(&config.settings_path)?;
    let inventory = Inventory::load_or_default(&config.inventory_path)?;
    info!(
        scenes = inventory.scenes.len(),
        devices = inventory.devices.len(),
        "inventory loaded"
    );

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // IPC server -> dispatcher
    let (command_tx, command_rx) = mpsc::channel(32);
    // Automator -> subscribed IPC clients
    let (event_tx, _event_rx) = broadcast::channel::<AutomatorEvent>(64);

    let automator = Automator::new(
        MemoryHost::from_inventory(inventory),
        settings,
        config.poll_interval,
        event_tx.clone(),
    );
    let mut dispatcher = Dispatcher::new(automator).with_settings_store(config.settings_path.clone());

    let server = Server::new(&config.socket_path, command_tx, event_tx)?;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Run the dispatcher (owns the automator)
        _ = dispatcher.run(command_rx) => {
            info!("dispatcher exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "failed to listen for shutdown signals"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    dispatcher.shutdown();
    server.shutdown().await;

    info!("mute-automator stopped");

    Ok(())
}
