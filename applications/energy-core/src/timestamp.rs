use chrono::{NaiveDate, NaiveDateTime};

use crate::bucket::Resolution;
use crate::error::{CoreError, Result};

/// Temporal precision of a reading identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// `YYYYMMDDTHHMMSS`
    Second,
    /// `YYYYMMDDTHHMM`
    Minute,
    /// `YYYYMMDD`
    Day,
}

/// Parse the capture instant encoded in a reading identifier.
///
/// Identifiers are ASCII digits with an optional literal `T` between the
/// date and time parts. Three widths are accepted (after stripping the
/// separator): 14 digits (seconds), 12 digits (minutes, seconds default
/// to 0) and 8 digits (date only, time defaults to 00:00:00). Months are
/// 1-based on the wire. Anything else is upstream data corruption and
/// fails with `MalformedIdentifier`.
pub fn parse_instant(id: &str) -> Result<NaiveDateTime> {
    let cleaned = id.replacen('T', "", 1);

    let (with_time, with_seconds) = match cleaned.len() {
        14 => (true, true),
        12 => (true, false),
        8 => (false, false),
        _ => return Err(malformed(id)),
    };

    let year: i32 = digits(&cleaned, 0..4, id)?;
    let month: u32 = digits(&cleaned, 4..6, id)? as u32;
    let day: u32 = digits(&cleaned, 6..8, id)? as u32;

    let mut hour = 0u32;
    let mut minute = 0u32;
    let mut second = 0u32;
    if with_time {
        hour = digits(&cleaned, 8..10, id)? as u32;
        minute = digits(&cleaned, 10..12, id)? as u32;
        if with_seconds {
            second = digits(&cleaned, 12..14, id)? as u32;
        }
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| malformed(id))
}

/// Re-encode an instant as a reading identifier at the given precision.
/// Round-trips bit-exact with `parse_instant` for all three widths.
pub fn encode_instant(instant: NaiveDateTime, precision: Precision) -> String {
    let fmt = match precision {
        Precision::Second => "%Y%m%dT%H%M%S",
        Precision::Minute => "%Y%m%dT%H%M",
        Precision::Day => "%Y%m%d",
    };
    instant.format(fmt).to_string()
}

/// Short chart tick label for a reading identifier at a given resolution.
pub fn format_label(id: &str, resolution: Resolution) -> Result<String> {
    let instant = parse_instant(id)?;
    Ok(label_for(instant, resolution))
}

pub(crate) fn label_for(instant: NaiveDateTime, resolution: Resolution) -> String {
    let fmt = match resolution {
        Resolution::Rolling24h => "%H:%M",
        Resolution::Week => "%b %-d %H",
        Resolution::Month => "%b %-d",
        Resolution::Year => "%b %Y",
    };
    instant.format(fmt).to_string()
}

/// Complete, locale-independent date-time string for detail displays.
pub fn format_full_datetime(id: &str) -> Result<String> {
    let instant = parse_instant(id)?;
    Ok(instant.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn digits(cleaned: &str, range: std::ops::Range<usize>, original: &str) -> Result<i32> {
    cleaned
        .get(range)
        .and_then(|s| s.parse::<i32>().ok())
        .filter(|n| *n >= 0)
        .ok_or_else(|| malformed(original))
}

fn malformed(id: &str) -> CoreError {
    CoreError::MalformedIdentifier { id: id.to_string() }
}
