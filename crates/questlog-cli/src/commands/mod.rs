pub mod badge;
pub mod config;
pub mod habit;
pub mod insights;
pub mod plan;
pub mod stats;
pub mod task;

use std::error::Error;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use questlog_core::{Config, Database, Event, EventSink, NullSink, SinkError, Tracker};
use serde::Serialize;

/// Prints badge toasts to stderr so stdout stays machine-readable.
struct ToastSink;

impl EventSink for ToastSink {
    fn publish(&self, event: &Event) -> Result<(), SinkError> {
        if let Event::BadgeEarned {
            name,
            description,
            emoji,
            points,
            ..
        } = event
        {
            eprintln!("{emoji} Badge earned: {name} (+{points} pts) {description}");
        }
        Ok(())
    }
}

/// Tracker over the data-directory database, configured from `config.toml`.
pub fn open_tracker() -> Result<(Tracker, Config), Box<dyn Error>> {
    let config = Config::load()?;
    let sink: Arc<dyn EventSink> = if config.notifications.enabled {
        Arc::new(ToastSink)
    } else {
        Arc::new(NullSink)
    };
    let db = Database::open()?;
    tracing::debug!(path = ?db.path(), owner = %config.owner_id, "opened tracker");
    let tracker = Tracker::from_config(db, &config, sink);
    Ok((tracker, config))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, Box<dyn Error>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = parse_date(raw)?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date '{raw}'").into())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn Error>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM-DD or RFC 3339, got '{raw}'").into())
}

pub fn split_tags(raw: Option<String>) -> Vec<String> {
    raw.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
