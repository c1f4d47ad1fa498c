use anyhow::{Context, Result};
use rusqlite::params;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::ManualTemperature,
};

impl Database {
    pub async fn insert_manual_temperature(&self, reading: &ManualTemperature) -> Result<i64> {
        let record = reading.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO temperature (session_id, timestamp, meat_temp, smoker_temp, note)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.session_id,
                    format_datetime(&record.timestamp),
                    record.meat_temp,
                    record.smoker_temp,
                    record.note,
                ],
            )
            .with_context(|| {
                format!("failed to insert temperature for session {}", record.session_id)
            })?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn get_manual_temperatures_for_session(
        &self,
        session_id: i64,
    ) -> Result<Vec<ManualTemperature>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, timestamp, meat_temp, smoker_temp, note
                 FROM temperature
                 WHERE session_id = ?1
                 ORDER BY timestamp ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut readings = Vec::new();
            while let Some(row) = rows.next()? {
                let timestamp: String = row.get(2)?;
                readings.push(ManualTemperature {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    timestamp: parse_datetime(&timestamp, "timestamp")?,
                    meat_temp: row.get(3)?,
                    smoker_temp: row.get(4)?,
                    note: row.get(5)?,
                });
            }

            Ok(readings)
        })
        .await
    }
}
