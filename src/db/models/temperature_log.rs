use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One converted controller sample. Any reading may be missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureLogEntry {
    pub id: Option<i64>,
    pub cook_id: i64,
    pub session_id: i64,
    pub timestamp: DateTime<Utc>,
    pub set_temp: Option<f64>,
    pub pit_temp: Option<f64>,
    pub meat_temp1: Option<f64>,
    pub blower: Option<f64>,
}
