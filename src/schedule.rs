//! Parsing of per-weekday availability strings such as `"09:00-12:00,14:00-17:00"`.

use crate::error::{BookingError, Result};
use chrono::NaiveTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

const OFF_SENTINEL: &str = "off";

lazy_static! {
    static ref RANGE_PATTERN: Regex =
        Regex::new(r"^(\d{1,2}:\d{2})\s*-\s*(\d{1,2}:\d{2})$").expect("valid range pattern");
}

/// Half-open interval `[start, end)` of wall-clock time within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

fn parse_time(value: &str, range: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        BookingError::InvalidScheduleFormat(format!("unparsable time '{value}' in '{range}'"))
    })
}

fn parse_range(range: &str) -> Result<TimeRange> {
    let captures = RANGE_PATTERN.captures(range).ok_or_else(|| {
        BookingError::InvalidScheduleFormat(format!("'{range}' is not of the form HH:MM-HH:MM"))
    })?;
    let start = parse_time(&captures[1], range)?;
    let end = parse_time(&captures[2], range)?;

    if start >= end {
        return Err(BookingError::InvalidScheduleFormat(format!(
            "range '{range}' does not start before it ends"
        )));
    }
    Ok(TimeRange { start, end })
}

/// Parses one day's availability into ranges ordered by start time.
///
/// An empty string or `off` (any case) means no availability. Ranges may touch
/// but not overlap.
pub fn parse_day_spec(day_spec: &str) -> Result<Vec<TimeRange>> {
    let day_spec = day_spec.trim();
    if day_spec.is_empty() || day_spec.eq_ignore_ascii_case(OFF_SENTINEL) {
        return Ok(vec![]);
    }

    let mut ranges = day_spec
        .split(',')
        .map(str::trim)
        .filter(|range| !range.is_empty())
        .map(parse_range)
        .collect::<Result<Vec<_>>>()?;
    ranges.sort_unstable_by_key(|range| range.start);

    if let Some(pair) = ranges.windows(2).find(|pair| pair[1].start < pair[0].end) {
        return Err(BookingError::InvalidScheduleFormat(format!(
            "ranges {}-{} and {}-{} overlap",
            pair[0].start.format("%H:%M"),
            pair[0].end.format("%H:%M"),
            pair[1].start.format("%H:%M"),
            pair[1].end.format("%H:%M"),
        )));
    }
    Ok(ranges)
}
