//! Recency window checks and the timestamp shapes the news providers emit.

use crate::types::TimeWindow;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// `true` iff `timestamp` is no older than `window_days` days before `now`.
/// A window reaching past the earliest representable instant admits everything.
pub fn is_within_window(timestamp: DateTime<Utc>, window_days: u32, now: DateTime<Utc>) -> bool {
    match Duration::try_days(i64::from(window_days)).and_then(|span| now.checked_sub_signed(span)) {
        Some(start) => timestamp >= start,
        None => true,
    }
}

/// A window pinned to one sample of "now", taken when a source call starts,
/// so the boundary does not move while slow pagination runs.
#[derive(Debug, Clone, Copy)]
pub struct RecencyFilter {
    window: TimeWindow,
    now: DateTime<Utc>,
}

impl RecencyFilter {
    pub fn snapshot(window: TimeWindow) -> Self {
        Self::at(window, Utc::now())
    }

    pub fn at(window: TimeWindow, now: DateTime<Utc>) -> Self {
        Self { window, now }
    }

    pub fn admits(&self, timestamp: DateTime<Utc>) -> bool {
        is_within_window(timestamp, self.window.days(), self.now)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }
}

/// Parses ISO-8601 style timestamps. Values without an offset are taken as UTC.
pub fn parse_iso_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses Unix epoch seconds given either as a JSON number or a numeric string.
pub fn parse_unix_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|secs| secs.trunc() as i64))?,
        serde_json::Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|secs| secs.trunc() as i64))?
        }
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
}
