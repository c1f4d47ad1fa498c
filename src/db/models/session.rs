//! Cook session model.
//!
//! A cook session is keyed by the controller's cook id, so a device and its
//! session share one identifier. `end_time` is `None` while the cook is open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MEAT_TYPE: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CookSession {
    pub id: i64,
    pub title: String,
    pub meat_type: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub target_temp: Option<f64>,
}

impl CookSession {
    /// Session row created the first time telemetry arrives for `cook_id`.
    pub fn from_first_sample(
        cook_id: i64,
        start_time: DateTime<Utc>,
        set_temp: Option<f64>,
    ) -> Self {
        Self {
            id: cook_id,
            title: format!("BBQ Session {cook_id} from flameboss"),
            meat_type: DEFAULT_MEAT_TYPE.to_string(),
            start_time: Some(start_time),
            end_time: None,
            target_temp: Some(set_temp.unwrap_or(0.0)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}
