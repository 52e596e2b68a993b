use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OceanError, Result};

/// Naive formats tried after RFC 3339, interpreted as UTC
const NAIVE_DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an observation timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, explicit offsets), ISO-8601
/// without a zone designator (taken as UTC) and plain `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format an instant the way upstream requests expect it (`...Z`)
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Closed time window with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting reversed bounds
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(OceanError::InvalidTimeRange {
                reason: format!(
                    "start {} is after end {}",
                    format_timestamp(&start),
                    format_timestamp(&end)
                ),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse a window from two timestamp strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_dt = parse_timestamp(start).ok_or_else(|| OceanError::InvalidTimeRange {
            reason: format!("unparsable start time '{}'", start),
        })?;
        let end_dt = parse_timestamp(end).ok_or_else(|| OceanError::InvalidTimeRange {
            reason: format!("unparsable end time '{}'", end),
        })?;
        Self::new(start_dt, end_dt)
    }

    /// Window covering the `days` days before `now`
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self { start: now - Duration::days(days), end: now }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length in whole days (truncated)
    pub fn span_days(&self) -> i64 {
        self.duration().num_days()
    }

    /// Half-open membership test, `start <= t < end`
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}
