pub mod db;
pub mod mqtt;
pub mod settings;
pub mod telemetry;
pub mod units;
mod utils;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use db::Database;
use mqtt::MqttListener;
use settings::ListenerSettings;
use telemetry::{
    snapshot_loop, DisconnectTimerRegistry, LatestTempCache, TelemetryHandler, SNAPSHOT_INTERVAL,
};

/// Starts the listener and blocks until Ctrl-C.
pub async fn run() -> Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("SmokeNotes MQTT listener starting up...");

    let settings = ListenerSettings::from_env().context("invalid listener configuration")?;
    let database = Database::new(settings.database_path.clone())?;

    // Sessions left open by a previous run stay open until a disconnect for
    // them arrives.
    let open_sessions = database.list_open_sessions().await?;
    if !open_sessions.is_empty() {
        let ids: Vec<i64> = open_sessions.iter().map(|session| session.id).collect();
        warn!("{} sessions are still open: {:?}", ids.len(), ids);
    }

    let cache = LatestTempCache::new();
    let handler = TelemetryHandler::new(
        database.clone(),
        cache.clone(),
        DisconnectTimerRegistry::new(),
    );
    let shutdown = CancellationToken::new();

    let snapshotter = tokio::spawn(snapshot_loop(
        database.clone(),
        cache,
        SNAPSHOT_INTERVAL,
        shutdown.clone(),
    ));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, shutting down");
                    shutdown.cancel();
                }
                Err(err) => error!("Failed to listen for Ctrl-C: {err}"),
            }
        });
    }

    let result = MqttListener::new(settings, handler).run(shutdown.clone()).await;

    shutdown.cancel();
    if let Err(err) = snapshotter.await {
        error!("Snapshot task failed to join: {err}");
    }

    result
}
