//! Date normalization for job time windows.
//!
//! Every time field leaves the client as a UTC ISO-8601 string with
//! millisecond precision (`2014-08-04T21:54:28.630Z`). Strings are parsed and
//! re-emitted in UTC, so an explicit offset in the input is not preserved.

use std::time::SystemTime;

use chrono::{
    DateTime, Datelike as _, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A point in time as a caller may have it at hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateLike {
    /// A calendar timestamp.
    Calendar(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// A textual timestamp (RFC 3339, or naive and read as UTC).
    Text(String),
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateLike {
    fn from(value: DateTime<Tz>) -> Self {
        DateLike::Calendar(value.with_timezone(&Utc))
    }
}

impl From<SystemTime> for DateLike {
    fn from(value: SystemTime) -> Self {
        DateLike::Calendar(DateTime::<Utc>::from(value))
    }
}

impl From<i64> for DateLike {
    fn from(value: i64) -> Self {
        DateLike::EpochMillis(value)
    }
}

impl From<&str> for DateLike {
    fn from(value: &str) -> Self {
        DateLike::Text(value.to_string())
    }
}

impl From<String> for DateLike {
    fn from(value: String) -> Self {
        DateLike::Text(value)
    }
}

/// Years that fit the four-digit wire form.
const WIRE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Convert any `DateLike` to its canonical wire form.
///
/// Instants outside years 0000-9999 are rejected, so every output parses back
/// to itself.
pub fn normalize(value: &DateLike) -> Result<String, ApiError> {
    let instant = match value {
        DateLike::Calendar(instant) => *instant,
        DateLike::EpochMillis(millis) => DateTime::from_timestamp_millis(*millis)
            .ok_or_else(|| ApiError::InvalidDate(millis.to_string()))?,
        DateLike::Text(text) => parse_text(text)?,
    };
    if !WIRE_YEARS.contains(&instant.year()) {
        return Err(ApiError::InvalidDate(describe(value)));
    }
    Ok(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn describe(value: &DateLike) -> String {
    match value {
        DateLike::Calendar(instant) => instant.to_rfc3339(),
        DateLike::EpochMillis(millis) => millis.to_string(),
        DateLike::Text(text) => text.clone(),
    }
}

fn parse_text(text: &str) -> Result<DateTime<Utc>, ApiError> {
    let trimmed = text.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::InvalidDate(text.to_string()))
}
