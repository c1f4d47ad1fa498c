use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

// Layout the web app's ORM uses for timestamp columns.
const SQL_DATETIME_WITH_OFFSET: &str = "%Y-%m-%d %H:%M:%S%.f%:z";
const SQL_DATETIME: &str = "%Y-%m-%d %H:%M:%S%.f";

const WRITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S%:z";
const WRITE_DATETIME_MICROS: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

/// `YYYY-MM-DD HH:MM:SS[.ffffff]+00:00`, the form the web app reads back.
/// Fractional seconds are written only when present, truncated to micros.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    let layout = if value.nanosecond() / 1_000 == 0 {
        WRITE_DATETIME
    } else {
        WRITE_DATETIME_MICROS
    };
    value.format(layout).to_string()
}

/// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS[.f][+HH:MM]` form. Values
/// without an offset are taken as UTC.
pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, SQL_DATETIME_WITH_OFFSET) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, SQL_DATETIME)
        .map(|naive| naive.and_utc())
        .with_context(|| format!("failed to parse {field} '{value}'"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}
