use std::time::Duration;

use chrono::{TimeZone, Utc};
use smokenotes_lib::{
    db::{Database, FLAMEBOSS_NOTE},
    telemetry::{
        persist_latest_temps, DisconnectTimerRegistry, HandleOutcome, LatestTempCache,
        TelemetryHandler, DISCONNECT_GRACE_PERIOD,
    },
};

fn open() -> (tempfile::TempDir, Database, LatestTempCache, TelemetryHandler) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Database::new(dir.path().join("bbq_sessions.db")).expect("open database");
    let cache = LatestTempCache::new();
    let handler = TelemetryHandler::new(db.clone(), cache.clone(), DisconnectTimerRegistry::new());
    (dir, db, cache, handler)
}

#[tokio::test]
async fn reference_sample_creates_session_log_and_snapshot() {
    let (_dir, db, cache, handler) = open();

    handler
        .handle(br#"{"cook_id":7,"sec":1700000000,"temps":[100,-32767],"set_temp":50,"blower":2500}"#)
        .await;

    let session = db.get_session(7).await.unwrap().expect("session 7 created");
    assert_eq!(session.title, "BBQ Session 7 from flameboss");
    assert_eq!(session.meat_type, "Unknown");
    assert_eq!(session.target_temp, Some(41.0));
    assert_eq!(session.end_time, None);

    let logs = db.get_temperature_logs_for_session(7).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].session_id, 7);
    assert_eq!(logs[0].timestamp, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    assert_eq!(logs[0].pit_temp, Some(50.0));
    assert_eq!(logs[0].meat_temp1, None);
    assert_eq!(logs[0].set_temp, Some(41.0));
    assert_eq!(logs[0].blower, Some(25.0));

    let tick = Utc.timestamp_opt(1_700_000_900, 0).unwrap();
    assert_eq!(persist_latest_temps(&db, &cache, tick).await, 1);

    let snapshots = db.get_manual_temperatures_for_session(7).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].smoker_temp, Some(50.0));
    assert_eq!(snapshots[0].meat_temp, None);
    assert_eq!(snapshots[0].note.as_deref(), Some(FLAMEBOSS_NOTE));
}

#[tokio::test]
async fn stored_timestamps_use_the_web_app_layout() {
    let (_dir, db, _cache, handler) = open();
    handler
        .handle(br#"{"cook_id":5,"sec":1700000000,"temps":[100,100]}"#)
        .await;

    let (start_time, logged_at) = db
        .execute(|conn| {
            let row = conn.query_row(
                "SELECT s.start_time, l.timestamp
                 FROM bbq_session s JOIN temperature_log l ON l.session_id = s.id
                 WHERE s.id = 5",
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )?;
            Ok(row)
        })
        .await
        .unwrap();

    assert_eq!(start_time, "2023-11-14 22:13:20+00:00");
    assert_eq!(logged_at, "2023-11-14 22:13:20+00:00");
}

#[tokio::test]
async fn replayed_message_does_not_duplicate_session() {
    let (_dir, db, _cache, handler) = open();
    let message = br#"{"cook_id":12,"sec":1700000000,"temps":[500,400]}"#;

    let first = handler.process(message).await.unwrap();
    let replay = handler.process(message).await.unwrap();

    assert!(matches!(first, HandleOutcome::Stored { session_created: true, .. }));
    assert!(matches!(replay, HandleOutcome::Stored { session_created: false, .. }));
    assert_eq!(db.list_open_sessions().await.unwrap().len(), 1);
    // The log is append-only, one row per handled message.
    assert_eq!(db.get_temperature_logs_for_session(12).await.unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn closed_session_gets_no_more_snapshots() {
    let (_dir, db, cache, handler) = open();

    handler
        .handle(br#"{"cook_id":3,"sec":1700000000,"temps":[1072,800]}"#)
        .await;
    let before = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
    assert_eq!(persist_latest_temps(&db, &cache, before).await, 1);

    handler
        .handle(br#"{"name":"disconnected","from":"mqttr-4"}"#)
        .await;

    tokio::time::sleep(DISCONNECT_GRACE_PERIOD + Duration::from_secs(1)).await;
    assert!(db.get_session_end_time(3).await.unwrap().flatten().is_some());

    let after = Utc.timestamp_opt(1_700_001_000, 0).unwrap();
    assert_eq!(persist_latest_temps(&db, &cache, after).await, 0);
    assert_eq!(db.get_manual_temperatures_for_session(3).await.unwrap().len(), 1);
    // The cache still holds the last reading.
    assert!(cache.get(3).is_some());
}

#[tokio::test]
async fn garbage_between_samples_is_ignored() {
    let (_dir, db, _cache, handler) = open();

    handler.handle(br#"{"cook_id":8,"sec":1700000000,"temps":[100,100]}"#).await;
    handler.handle(b"\x00\x01garbage").await;
    handler.handle(br#"{"temps":[100,100]}"#).await;
    handler.handle(br#"{"cook_id":8,"sec":1700000060,"temps":[110,100]}"#).await;

    assert_eq!(db.get_temperature_logs_for_session(8).await.unwrap().len(), 2);
}
