use std::{env, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_CLIENT_ID: &str = "smokenotes-mqtt";
const DEFAULT_DATABASE_PATH: &str = "/app/data/bbq_sessions.db";
const KEEP_ALIVE_SECS: u64 = 60;

/// Listener configuration, read once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerSettings {
    pub broker_host: String,
    pub broker_port: u16,
    pub username: String,
    #[serde(skip)]
    pub password: String,
    pub topic: String,
    pub client_id: String,
    pub database_path: PathBuf,
    pub keep_alive: Duration,
}

impl ListenerSettings {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::info!("Loaded environment overrides from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("required environment variable {key} is not set"))
        };

        let broker_port = match lookup("MQTT_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("MQTT_PORT '{raw}' is not a valid port"))?,
            None => DEFAULT_MQTT_PORT,
        };

        Ok(Self {
            broker_host: required("MQTT_BROKER")?,
            broker_port,
            username: required("MQTT_USERNAME")?,
            password: required("MQTT_PASSWORD")?,
            topic: required("MQTT_TOPIC")?,
            client_id: lookup("MQTT_CLIENT_ID").unwrap_or_else(|| DEFAULT_CLIENT_ID.into()),
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            keep_alive: Duration::from_secs(KEEP_ALIVE_SECS),
        })
    }
}
