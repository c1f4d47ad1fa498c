//! Inbound controller message schema.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::units::{blower_percent, probe_fahrenheit, set_point_fahrenheit};

pub const DISCONNECT_EVENT_NAME: &str = "disconnected";
pub const DISCONNECT_EVENT_SOURCE: &str = "mqttr-4";

/// Every field is optional on the wire; which ones matter depends on the
/// message kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub cook_id: Option<i64>,
    #[serde(default)]
    pub sec: Option<i64>,
    #[serde(default)]
    pub temps: Option<Vec<Option<i64>>>,
    #[serde(default)]
    pub set_temp: Option<i64>,
    #[serde(default)]
    pub blower: Option<i64>,
}

impl RawPayload {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("payload is not a JSON telemetry object")
    }

    pub fn is_disconnect(&self) -> bool {
        self.name.as_deref() == Some(DISCONNECT_EVENT_NAME)
            && self.from.as_deref() == Some(DISCONNECT_EVENT_SOURCE)
    }

    /// Cook id, treating `0` as absent like the controller does.
    pub fn cook_id(&self) -> Option<i64> {
        self.cook_id.filter(|id| *id != 0)
    }

    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        let sec = self.sec.ok_or_else(|| anyhow!("telemetry is missing 'sec'"))?;
        DateTime::<Utc>::from_timestamp(sec, 0)
            .ok_or_else(|| anyhow!("'sec' value {sec} is out of range"))
    }

    fn probe(&self, index: usize) -> Option<i64> {
        self.temps
            .as_ref()
            .and_then(|temps| temps.get(index).copied().flatten())
    }
}

/// A telemetry sample with every reading converted to display units.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub cook_id: i64,
    pub timestamp: DateTime<Utc>,
    pub set_temp: Option<f64>,
    pub pit_temp: Option<f64>,
    pub meat_temp: Option<f64>,
    pub blower: Option<f64>,
}

impl Sample {
    pub fn from_payload(cook_id: i64, payload: &RawPayload) -> Result<Self> {
        Ok(Self {
            cook_id,
            timestamp: payload.timestamp()?,
            set_temp: set_point_fahrenheit(payload.set_temp),
            pit_temp: probe_fahrenheit(payload.probe(0)),
            meat_temp: probe_fahrenheit(payload.probe(1)),
            blower: blower_percent(payload.blower),
        })
    }

    pub fn has_probe_reading(&self) -> bool {
        self.pit_temp.is_some() || self.meat_temp.is_some()
    }
}
