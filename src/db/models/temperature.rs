//! Manual temperature rows.
//!
//! The web app stores hand-entered readings here. The listener adds periodic
//! snapshots of the latest controller values, tagged with [`FLAMEBOSS_NOTE`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FLAMEBOSS_NOTE: &str = "From Flameboss";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManualTemperature {
    pub id: Option<i64>,
    pub session_id: i64,
    pub timestamp: DateTime<Utc>,
    pub meat_temp: Option<f64>,
    pub smoker_temp: Option<f64>,
    pub note: Option<String>,
}

impl ManualTemperature {
    pub fn flameboss_snapshot(
        session_id: i64,
        timestamp: DateTime<Utc>,
        meat_temp: Option<f64>,
        smoker_temp: Option<f64>,
    ) -> Self {
        Self {
            id: None,
            session_id,
            timestamp,
            meat_temp,
            smoker_temp,
            note: Some(FLAMEBOSS_NOTE.to_string()),
        }
    }
}
