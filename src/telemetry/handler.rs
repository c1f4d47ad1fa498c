use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use chrono::Utc;

use crate::db::{CookSession, Database, TemperatureLogEntry};

use super::{
    cache::{LatestReading, LatestTempCache},
    payload::{RawPayload, Sample},
    timers::DisconnectTimerRegistry,
};

// Set to false to silence per-message diagnostics from this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// How long a cook may stay silent after a disconnect before its session is
/// closed.
pub const DISCONNECT_GRACE_PERIOD: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Disconnect without a cook id, and no telemetry seen yet to fall back on.
    NoDisconnectTarget,
    MissingCookId,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NoDisconnectTarget => write!(f, "no cook_id available for disconnection"),
            DropReason::MissingCookId => write!(f, "no cook_id in message"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
    DisconnectScheduled {
        cook_id: i64,
        replaced: bool,
    },
    Stored {
        cook_id: i64,
        session_created: bool,
        disconnect_cancelled: bool,
    },
    Dropped(DropReason),
}

/// Turns controller messages into session, log and cache updates.
///
/// Messages are expected one at a time in arrival order. Each store write is
/// its own unit of work; the session insert is check-then-insert, so replaying
/// a message never creates a second session.
#[derive(Clone)]
pub struct TelemetryHandler {
    db: Database,
    cache: LatestTempCache,
    timers: DisconnectTimerRegistry,
    // Only meaningful while a single controller is active.
    last_seen: Arc<Mutex<Option<i64>>>,
    grace_period: Duration,
}

impl TelemetryHandler {
    pub fn new(db: Database, cache: LatestTempCache, timers: DisconnectTimerRegistry) -> Self {
        Self {
            db,
            cache,
            timers,
            last_seen: Arc::new(Mutex::new(None)),
            grace_period: DISCONNECT_GRACE_PERIOD,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn cache(&self) -> &LatestTempCache {
        &self.cache
    }

    pub fn timers(&self) -> &DisconnectTimerRegistry {
        &self.timers
    }

    pub fn last_seen_cook_id(&self) -> Option<i64> {
        match self.last_seen.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Processes one message. Failures are logged and the message is dropped.
    pub async fn handle(&self, payload: &[u8]) {
        match self.process(payload).await {
            Ok(HandleOutcome::Dropped(reason)) => {
                log_warn!("Skipping message: {reason}");
            }
            Ok(outcome) => {
                log_debug!("Handled message: {outcome:?}");
            }
            Err(err) => {
                log_error!("Error processing MQTT message: {err:#}");
            }
        }
    }

    pub async fn process(&self, payload: &[u8]) -> Result<HandleOutcome> {
        let payload = RawPayload::parse(payload)?;
        log_debug!("Received payload: {payload:?}");

        if payload.is_disconnect() {
            self.on_disconnect(&payload).await
        } else {
            self.on_sample(&payload).await
        }
    }

    async fn on_disconnect(&self, payload: &RawPayload) -> Result<HandleOutcome> {
        let Some(cook_id) = payload.cook_id().or_else(|| self.last_seen_cook_id()) else {
            return Ok(HandleOutcome::Dropped(DropReason::NoDisconnectTarget));
        };

        let replaced = self
            .timers
            .schedule(
                cook_id,
                self.grace_period,
                close_after_grace(self.db.clone(), cook_id),
            )
            .await;

        if replaced {
            log_info!("Disconnection timer restarted for cook_id {cook_id}");
        } else {
            log_info!("Disconnection timer started for cook_id {cook_id}");
        }

        Ok(HandleOutcome::DisconnectScheduled { cook_id, replaced })
    }

    async fn on_sample(&self, payload: &RawPayload) -> Result<HandleOutcome> {
        let Some(cook_id) = payload.cook_id() else {
            return Ok(HandleOutcome::Dropped(DropReason::MissingCookId));
        };

        self.remember(cook_id);

        let disconnect_cancelled = self.timers.cancel(cook_id).await;
        if disconnect_cancelled {
            log_info!("Disconnection timer cancelled for cook_id {cook_id}");
        }

        let sample = Sample::from_payload(cook_id, payload)?;

        if sample.has_probe_reading() {
            self.cache.record(
                cook_id,
                LatestReading {
                    meat: sample.meat_temp,
                    smoker: sample.pit_temp,
                },
            );
        }

        let session = CookSession::from_first_sample(cook_id, sample.timestamp, sample.set_temp);
        let session_created = self.db.create_session_if_absent(&session).await?;
        if session_created {
            log_info!("Created new BBQ session with ID {cook_id}");
        } else if let Some(set_temp) = sample.set_temp {
            self.db.update_target_temp(cook_id, set_temp).await?;
            log_debug!("Updated target temperature for session {cook_id} to {set_temp}°F");
        }

        self.db
            .insert_temperature_log(&TemperatureLogEntry {
                id: None,
                cook_id,
                session_id: cook_id,
                timestamp: sample.timestamp,
                set_temp: sample.set_temp,
                pit_temp: sample.pit_temp,
                meat_temp1: sample.meat_temp,
                blower: sample.blower,
            })
            .await?;
        log_debug!("Stored log for cook_id {cook_id} at {}", sample.timestamp);

        Ok(HandleOutcome::Stored {
            cook_id,
            session_created,
            disconnect_cancelled,
        })
    }

    fn remember(&self, cook_id: i64) {
        let mut guard = match self.last_seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(cook_id);
    }
}

async fn close_after_grace(db: Database, cook_id: i64) {
    let now = Utc::now();
    match db.close_session(cook_id, now).await {
        Ok(true) => log_info!("Set end_time for session {cook_id} at {now}"),
        Ok(false) => log_info!("Session {cook_id} already closed or unknown; end_time unchanged"),
        Err(err) => log_error!("Failed to close session {cook_id}: {err:#}"),
    }
}
