use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::models::Meridiem;

/// Candidate formats, tried in order; first hit wins. Combined forms
/// cover the exports that ship one timestamp column, the split lists
/// cover date + time pairs.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m/%d/%y", "%d-%b-%Y"];

const TIME_FORMATS: &[&str] = &["%I:%M:%S %p", "%I:%M %p", "%H:%M:%S", "%H:%M"];

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| parse_with(raw, fmt, NaiveDateTime::parse_from_str))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| parse_with(raw, fmt, NaiveDate::parse_from_str))
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| parse_with(raw, fmt, NaiveTime::parse_from_str))
}

// AM/PM markers arrive in any casing; uppercase before handing a %p or
// %b format to chrono.
fn parse_with<T>(
    raw: &str,
    fmt: &str,
    parse: fn(&str, &str) -> chrono::ParseResult<T>,
) -> Option<T> {
    if fmt.contains("%p") || fmt.contains("%b") {
        parse(&raw.to_uppercase(), fmt).ok()
    } else {
        parse(raw, fmt).ok()
    }
}

/// Merge the available source fields into one timestamp. A combined
/// timestamp column is preferred; otherwise the date column carries the
/// day and the time column, when present, must parse too (a garbled time
/// invalidates the row rather than silently flooring it). A date with no
/// time field parses to midnight.
pub fn reconcile(
    timestamp: Option<&str>,
    date: Option<&str>,
    time: Option<&str>,
) -> Option<NaiveDateTime> {
    if let Some(raw) = timestamp {
        if let Some(ts) = parse_datetime(raw) {
            return Some(ts);
        }
        // fall through: some exports put a bare date in the timestamp column
        if let Some(d) = parse_date(raw) {
            return Some(d.and_time(NaiveTime::MIN));
        }
        return None;
    }

    let date = parse_date(date?)?;
    match time {
        Some(raw) => parse_time(raw).map(|t| date.and_time(t)),
        None => Some(date.and_time(NaiveTime::MIN)),
    }
}

/// AM/PM from the already-parsed hour, for sources where it was never
/// explicit.
pub fn meridiem_of(ts: NaiveDateTime) -> Meridiem {
    if ts.hour() < 12 {
        Meridiem::Am
    } else {
        Meridiem::Pm
    }
}
