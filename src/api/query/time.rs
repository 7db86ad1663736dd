//! Timestamps, durations and the automatic step size of range queries

use chrono::{DateTime, Duration as TimeDelta, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::time::Duration;

use crate::error::{MaiaError, Result};

/// Ascending step sizes a range query picks from when `--step` is not given
pub const STEP_LADDER: [Duration; 22] = [
    Duration::from_secs(15),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(90),
    Duration::from_secs(2 * 60),
    Duration::from_secs(3 * 60),
    Duration::from_secs(5 * 60),
    Duration::from_secs(10 * 60),
    Duration::from_secs(15 * 60),
    Duration::from_secs(20 * 60),
    Duration::from_secs(30 * 60),
    Duration::from_secs(3600),
    Duration::from_secs(2 * 3600),
    Duration::from_secs(3 * 3600),
    Duration::from_secs(8 * 3600),
    Duration::from_secs(12 * 3600),
    Duration::from_secs(24 * 3600),
    Duration::from_secs(2 * 24 * 3600),
    Duration::from_secs(3 * 24 * 3600),
    Duration::from_secs(7 * 24 * 3600),
    Duration::from_secs(14 * 24 * 3600),
    Duration::from_secs(30 * 24 * 3600),
];

/// Number of buckets a range query aims for when sizing its step
const TARGET_BUCKETS: u32 = 10;

/// Lookback used when a query has no start time
const DEFAULT_RANGE_HOURS: i64 = 3;

/// Smallest ladder step strictly greater than a tenth of the range.
///
/// Ranges longer than the ladder covers keep the computed tenth.
pub fn select_step(range: Duration) -> Duration {
    let target = range / TARGET_BUCKETS;
    STEP_LADDER
        .iter()
        .copied()
        .find(|step| *step > target)
        .unwrap_or(target)
}

/// Parse RFC 3339, falling back to the Unix `date` layout
/// (`Mon Jan _2 15:04:05 MST 2006`).
pub fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    parse_unix_date(value).ok_or_else(|| {
        MaiaError::config(format!(
            "invalid timestamp '{}': use RFC 3339 (2006-01-02T15:04:05Z) or Unix date format (Mon Jan _2 15:04:05 MST 2006)",
            value
        ))
    })
}

fn parse_unix_date(value: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 6 {
        return None;
    }
    let zone = parts[4];
    let without_zone = format!("{} {} {} {} {}", parts[0], parts[1], parts[2], parts[3], parts[5]);
    let naive = NaiveDateTime::parse_from_str(&without_zone, "%a %b %e %H:%M:%S %Y").ok()?;

    match zone.parse::<chrono_tz::Tz>() {
        Ok(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc)),
        // unknown abbreviations are taken as UTC
        Err(_) => Some(Utc.from_utc_datetime(&naive)),
    }
}

pub fn format_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Fill in missing range bounds: the end defaults to `now`, the start to three
/// hours before the end. Given bounds are passed through untouched.
pub fn default_time_range(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(String, String)> {
    let end = match end.filter(|e| !e.is_empty()) {
        Some(end) => end.to_string(),
        None => format_time(now),
    };
    let start = match start.filter(|s| !s.is_empty()) {
        Some(start) => start.to_string(),
        None => format_time(parse_time(&end)? - TimeDelta::hours(DEFAULT_RANGE_HOURS)),
    };
    Ok((start, end))
}

/// Whole seconds with a unit suffix, the only duration encoding the backend
/// accepts for `step` and `timeout`.
pub fn format_seconds(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

/// Parse a Go-style duration such as `90s`, `5m`, `1h30m` or `1.5h`.
/// `d` (days) and `w` (weeks) are accepted as well.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let invalid = || MaiaError::config(format!("invalid duration '{}'", value));
    let trimmed = value.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut total = 0f64;
    let mut rest = trimmed;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let number: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "d" => 86400.0,
            "w" => 7.0 * 86400.0,
            _ => return Err(invalid()),
        };
        total += number * seconds_per_unit;
        rest = &rest[unit_len..];
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}
