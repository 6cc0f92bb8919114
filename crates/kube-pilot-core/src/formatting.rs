//! Formatting utilities for table cells
//!
//! Ages follow kubectl's compact style with two significant units.

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Format a duration in seconds with two significant units
///
/// Negative durations render as `0s`.
///
/// # Examples
///
/// ```
/// use kube_pilot_core::formatting::format_age_secs;
///
/// assert_eq!(format_age_secs(45), "45s");
/// assert_eq!(format_age_secs(200), "3m20s");
/// assert_eq!(format_age_secs(7_500), "2h5m");
/// assert_eq!(format_age_secs(90_061), "1d1h");
/// ```
pub fn format_age_secs(secs: i64) -> String {
    if secs < 0 {
        "0s".to_string()
    } else if secs < MINUTE {
        format!("{}s", secs)
    } else if secs < HOUR {
        format!("{}m{}s", secs / MINUTE, secs % MINUTE)
    } else if secs < DAY {
        format!("{}h{}m", secs / HOUR, (secs % HOUR) / MINUTE)
    } else {
        format!("{}d{}h", secs / DAY, (secs % DAY) / HOUR)
    }
}

/// Age of an object from its raw creation timestamp
///
/// Missing or malformed timestamps render as `0s`.
pub fn format_age(creation: Option<&str>, now: DateTime<Utc>) -> String {
    match creation.and_then(parse_timestamp) {
        Some(created) => format_age_secs(now.signed_duration_since(created).num_seconds()),
        None => "0s".to_string(),
    }
}

/// Parse an RFC 3339 timestamp as emitted by the API server
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Format a ratio as "X/Y"
pub fn format_ratio(numerator: usize, denominator: usize) -> String {
    format!("{}/{}", numerator, denominator)
}

/// Left-align text in a column of at least `width` characters
pub fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}
