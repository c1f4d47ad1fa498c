use anyhow::{Context, Result};
use rusqlite::params;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::TemperatureLogEntry,
};

impl Database {
    pub async fn insert_temperature_log(&self, entry: &TemperatureLogEntry) -> Result<i64> {
        let record = entry.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO temperature_log (
                    cook_id,
                    session_id,
                    timestamp,
                    set_temp,
                    pit_temp,
                    meat_temp1,
                    blower
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.cook_id,
                    record.session_id,
                    format_datetime(&record.timestamp),
                    record.set_temp,
                    record.pit_temp,
                    record.meat_temp1,
                    record.blower,
                ],
            )
            .with_context(|| format!("failed to insert temperature log for cook {}", record.cook_id))?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn get_temperature_logs_for_session(
        &self,
        session_id: i64,
    ) -> Result<Vec<TemperatureLogEntry>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    id,
                    cook_id,
                    session_id,
                    timestamp,
                    set_temp,
                    pit_temp,
                    meat_temp1,
                    blower
                FROM temperature_log
                WHERE session_id = ?1
                ORDER BY timestamp ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                let timestamp: String = row.get(3)?;
                entries.push(TemperatureLogEntry {
                    id: row.get(0)?,
                    cook_id: row.get(1)?,
                    session_id: row.get(2)?,
                    timestamp: parse_datetime(&timestamp, "timestamp")?,
                    set_temp: row.get(4)?,
                    pit_temp: row.get(5)?,
                    meat_temp1: row.get(6)?,
                    blower: row.get(7)?,
                });
            }

            Ok(entries)
        })
        .await
    }
}
