//! PairLink hosting service
//!
//! Thin wiring binary: builds the session registry and the announcer by
//! explicit injection, starts announcing, logs registry events, and unwinds
//! on ctrl-c. The connection transport is owned by the embedding
//! application; a desktop shell would replace [`LogAlerts`] with dialogs.

use std::sync::Arc;

use anyhow::Result;
use pairlink_core::{Response, ServerConfig, DEFAULT_DISCOVERY_PORT, DEFAULT_PORT};
use pairlink_discovery::{AlertSink, Announcer};
use pairlink_registry::{DeviceRegistry, RegistryEvent};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Surfaces announcer alerts on the log
struct LogAlerts;

impl AlertSink for LogAlerts {
    fn warning(&self, title: &str, body: &str) {
        warn!("{}: {}", title, body);
    }

    fn error(&self, title: &str, body: &str) {
        error!("{}: {}", title, body);
    }
}

fn config_from_env() -> ServerConfig {
    let app_name =
        std::env::var("PAIRLINK_NAME").unwrap_or_else(|_| "PairLink Server".to_string());
    let port = std::env::var("PAIRLINK_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let discovery_port = std::env::var("PAIRLINK_DISCOVERY_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DISCOVERY_PORT);

    ServerConfig {
        app_name,
        port,
        discovery_port,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config_from_env();
    info!(
        "starting {} v{} on port {}",
        config.app_name, config.version, config.port
    );

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let registry = Arc::new(DeviceRegistry::new(&config, events_tx));
    let announcer = Announcer::new(config, Arc::new(LogAlerts));

    announcer.start();

    // The transport layer drives `registry` with connection events; this
    // loop reports the devices it sees going away.
    let event_task = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                RegistryEvent::DeviceDisconnected { device_id, error } => match error {
                    Some(err) => warn!("device {} dropped: {}", device_id, err),
                    None => info!("device {} disconnected", device_id),
                },
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    if !registry.is_empty() {
        registry.broadcast(&Response::Kick).await;
    }
    announcer.stop();
    event_task.abort();

    Ok(())
}
