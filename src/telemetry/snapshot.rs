use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::db::{Database, ManualTemperature};

use super::cache::LatestTempCache;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(900);

/// Writes the cached latest readings into `temperature` every `period` until
/// `cancel_token` fires. The first tick runs immediately.
pub async fn snapshot_loop(
    db: Database,
    cache: LatestTempCache,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let persisted = persist_latest_temps(&db, &cache, now).await;
                log_info!("[{now}] Persisted temperatures for {persisted} active sessions.");
            }
            _ = cancel_token.cancelled() => {
                log_info!("snapshot loop shutting down");
                break;
            }
        }
    }
}

/// One snapshot tick. Returns the number of rows written.
///
/// Sessions that are closed or unknown to the store are skipped. A failure
/// for one cook is logged and the remaining cooks are still processed.
pub async fn persist_latest_temps(
    db: &Database,
    cache: &LatestTempCache,
    now: DateTime<Utc>,
) -> usize {
    let mut persisted = 0;

    for (cook_id, reading) in cache.snapshot() {
        match persist_one(db, cook_id, reading.meat, reading.smoker, now).await {
            Ok(true) => persisted += 1,
            Ok(false) => {}
            Err(err) => log_error!("snapshot for session {cook_id} failed: {err:#}"),
        }
    }

    persisted
}

async fn persist_one(
    db: &Database,
    session_id: i64,
    meat: Option<f64>,
    smoker: Option<f64>,
    now: DateTime<Utc>,
) -> Result<bool> {
    match db.get_session_end_time(session_id).await? {
        Some(None) => {}
        Some(Some(_)) => return Ok(false),
        None => {
            log_warn!("cached readings for unknown session {session_id}; skipping");
            return Ok(false);
        }
    }

    db.insert_manual_temperature(&ManualTemperature::flameboss_snapshot(
        session_id, now, meat, smoker,
    ))
    .await?;
    Ok(true)
}
