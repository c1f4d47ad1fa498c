use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_optional_datetime},
    models::CookSession,
};

const SESSION_COLUMNS: &str = "id, title, meat_type, start_time, end_time, target_temp";

fn row_to_session(row: &Row) -> Result<CookSession> {
    let start_time: Option<String> = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;

    Ok(CookSession {
        id: row.get("id")?,
        title: row.get("title")?,
        meat_type: row.get("meat_type")?,
        start_time: parse_optional_datetime(start_time, "start_time")?,
        end_time: parse_optional_datetime(end_time, "end_time")?,
        target_temp: row.get("target_temp")?,
    })
}

impl Database {
    /// Inserts `session` unless a row with its id already exists.
    ///
    /// Returns `true` when a row was created. Safe to repeat for the same id.
    pub async fn create_session_if_absent(&self, session: &CookSession) -> Result<bool> {
        let record = session.clone();
        self.execute(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT id FROM bbq_session WHERE id = ?1",
                    params![record.id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if exists {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO bbq_session (id, title, meat_type, start_time, end_time, target_temp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.title,
                    record.meat_type,
                    record.start_time.as_ref().map(format_datetime),
                    record.end_time.as_ref().map(format_datetime),
                    record.target_temp,
                ],
            )
            .with_context(|| format!("failed to insert session {}", record.id))?;
            Ok(true)
        })
        .await
    }

    pub async fn update_target_temp(&self, session_id: i64, target_temp: f64) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "UPDATE bbq_session SET target_temp = ?1 WHERE id = ?2",
                params![target_temp, session_id],
            )
            .with_context(|| format!("failed to update target temp for session {session_id}"))?;
            Ok(())
        })
        .await
    }

    /// Sets `end_time` for a session that is still open.
    ///
    /// Returns `false` if the session is unknown or was already closed.
    pub async fn close_session(&self, session_id: i64, ended_at: DateTime<Utc>) -> Result<bool> {
        self.execute(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE bbq_session
                     SET end_time = ?1
                     WHERE id = ?2 AND end_time IS NULL",
                    params![format_datetime(&ended_at), session_id],
                )
                .with_context(|| format!("failed to close session {session_id}"))?;
            Ok(updated > 0)
        })
        .await
    }

    /// `None` when the session does not exist, `Some(None)` while it is open.
    pub async fn get_session_end_time(
        &self,
        session_id: i64,
    ) -> Result<Option<Option<DateTime<Utc>>>> {
        self.execute(move |conn| {
            let raw = conn
                .query_row(
                    "SELECT end_time FROM bbq_session WHERE id = ?1",
                    params![session_id],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?;

            match raw {
                Some(end_time) => Ok(Some(parse_optional_datetime(end_time, "end_time")?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn get_session(&self, session_id: i64) -> Result<Option<CookSession>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM bbq_session WHERE id = ?1"
            ))?;

            let mut rows = stmt.query(params![session_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_session(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn list_open_sessions(&self) -> Result<Vec<CookSession>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS}
                 FROM bbq_session
                 WHERE end_time IS NULL
                 ORDER BY start_time DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = Database::new(dir.path().join("bbq.db")).expect("open database");
        (dir, db)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn create_is_check_then_insert() {
        let (_dir, db) = open_db();
        let session = CookSession::from_first_sample(7, at(1_700_000_000), Some(41.0));

        assert!(db.create_session_if_absent(&session).await.unwrap());
        assert!(!db.create_session_if_absent(&session).await.unwrap());

        let stored = db.get_session(7).await.unwrap().expect("session 7");
        assert_eq!(stored, session);
        assert_eq!(stored.title, "BBQ Session 7 from flameboss");
        assert_eq!(stored.meat_type, "Unknown");
    }

    #[tokio::test]
    async fn missing_set_point_defaults_target_to_zero() {
        let (_dir, db) = open_db();
        let session = CookSession::from_first_sample(3, at(1_700_000_000), None);
        db.create_session_if_absent(&session).await.unwrap();

        let stored = db.get_session(3).await.unwrap().unwrap();
        assert_eq!(stored.target_temp, Some(0.0));
    }

    #[tokio::test]
    async fn update_target_temp_overwrites_latest() {
        let (_dir, db) = open_db();
        db.create_session_if_absent(&CookSession::from_first_sample(1, at(0), Some(225.0)))
            .await
            .unwrap();

        db.update_target_temp(1, 250.0).await.unwrap();
        db.update_target_temp(1, 275.0).await.unwrap();

        let stored = db.get_session(1).await.unwrap().unwrap();
        assert_eq!(stored.target_temp, Some(275.0));
    }

    #[tokio::test]
    async fn close_only_applies_once() {
        let (_dir, db) = open_db();
        db.create_session_if_absent(&CookSession::from_first_sample(9, at(0), None))
            .await
            .unwrap();

        assert_eq!(db.get_session_end_time(9).await.unwrap(), Some(None));

        assert!(db.close_session(9, at(100)).await.unwrap());
        assert!(!db.close_session(9, at(200)).await.unwrap());

        assert_eq!(db.get_session_end_time(9).await.unwrap(), Some(Some(at(100))));
    }

    #[tokio::test]
    async fn unknown_session_reads_as_none() {
        let (_dir, db) = open_db();
        assert_eq!(db.get_session_end_time(404).await.unwrap(), None);
        assert!(db.get_session(404).await.unwrap().is_none());
        assert!(!db.close_session(404, at(1)).await.unwrap());
    }

    #[tokio::test]
    async fn lists_only_open_sessions() {
        let (_dir, db) = open_db();
        for id in [1, 2, 3] {
            db.create_session_if_absent(&CookSession::from_first_sample(id, at(id * 10), None))
                .await
                .unwrap();
        }
        db.close_session(2, at(500)).await.unwrap();

        let open: Vec<i64> = db
            .list_open_sessions()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(open, vec![3, 1]);
    }
}
