//! Timestamp parsing and label formatting
//!
//! Backends send timestamps as `YYYY-MM-DD HH:mm:ss`, ISO-8601 with or without
//! seconds, fractional seconds, or a zone designator. Everything is converted
//! once, at the ingestion boundary, into a `DateTime<Utc>`. Inputs without a
//! zone designator are read in the configured display offset.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc,
};

use crate::types::TimeRange;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const ZONED_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];

/// Parse a backend timestamp, returning `None` for anything unparseable.
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replacen(' ', "T", 1);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    let zoned = match normalized
        .strip_suffix('Z')
        .or_else(|| normalized.strip_suffix('z'))
    {
        Some(head) => format!("{head}+00:00"),
        None => normalized.clone(),
    };
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // Extra colon-separated groups after the seconds are dropped
    let truncated = if normalized.split(':').count() > 3 {
        normalized.split(':').take(3).collect::<Vec<_>>().join(":")
    } else {
        normalized
    };

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&truncated, format) {
            return local_to_utc(naive, offset);
        }
    }

    // Date-only strings denote UTC midnight
    NaiveDate::parse_from_str(&truncated, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn local_to_utc(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Short axis label: `HH:MM` for a single day, `MM/DD HH:MM` otherwise
pub fn display_label(time: DateTime<Utc>, offset: FixedOffset, range: TimeRange) -> String {
    let local = time.with_timezone(&offset);
    if range.days() > 1 {
        local.format("%m/%d %H:%M").to_string()
    } else {
        local.format("%H:%M").to_string()
    }
}

/// Full tooltip label: `MM/DD HH:MM`
pub fn full_label(time: DateTime<Utc>, offset: FixedOffset) -> String {
    time.with_timezone(&offset).format("%m/%d %H:%M").to_string()
}

/// Build a fixed offset from minutes east of UTC, falling back to UTC
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix())
}

/// Serde adapter encoding instants as RFC 3339 with millisecond precision
pub mod serde_millis {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw, Utc.fix())
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
