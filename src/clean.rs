use crate::columns::{ColumnMap, Field};
use crate::ingest::RawTable;
use crate::models::{CanonicalRecord, Completion};
use crate::timestamp;

/// Why a row was dropped during standardization. Each variant has a
/// counter in `CleanStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSkip {
    MissingVideo,
    BadTimestamp,
    InvalidDuration,
}

const TRUTHY: &[&str] = &[
    "yes",
    "y",
    "true",
    "t",
    "1",
    "done",
    "completed",
    "complete",
    "finished",
];

const FALSY: &[&str] = &[
    "no",
    "n",
    "false",
    "f",
    "0",
    "incomplete",
    "not completed",
    "unfinished",
    "partial",
];

/// Duration in minutes from the mixed encodings seen in exports: bare
/// numerics are seconds (the source column is `*_ViewingDuration` in
/// seconds), unit suffixes override, clock forms are `mm:ss` or
/// `hh:mm:ss`. Returns None when nothing numeric can be extracted.
pub fn parse_duration_minutes(raw: &str) -> Option<f64> {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() {
        return None;
    }

    if raw.contains(':') {
        let parts: Vec<&str> = raw.split(':').collect();
        let nums: Option<Vec<f64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
        return match nums?.as_slice() {
            [m, s] => Some(m + s / 60.0),
            [h, m, s] => Some(h * 60.0 + m + s / 60.0),
            _ => None,
        }
        .filter(|v| v.is_finite());
    }

    let split = raw
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(raw.len());
    let value: f64 = raw[..split].trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    let minutes = match raw[split..].trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => value / 60.0,
        "m" | "min" | "mins" | "minute" | "minutes" => value,
        "h" | "hr" | "hrs" | "hour" | "hours" => value * 60.0,
        _ => return None,
    };
    Some(minutes)
}

/// Completion from whatever the export used: boolean words, 1/0,
/// percentages, free text. Unrecognized values stay Unknown rather than
/// guessing.
pub fn parse_completion(raw: Option<&str>) -> Completion {
    let Some(raw) = raw else {
        return Completion::Unknown;
    };
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return Completion::Unknown;
    }

    if let Some(pct) = value.strip_suffix('%') {
        return match pct.trim().parse::<f64>() {
            Ok(p) if p >= 100.0 => Completion::Completed,
            Ok(_) => Completion::NotCompleted,
            Err(_) => Completion::Unknown,
        };
    }

    // check falsy first so "not completed" never hits the "completed" word
    if FALSY.iter().any(|w| *w == value) {
        Completion::NotCompleted
    } else if TRUTHY.iter().any(|w| *w == value) {
        Completion::Completed
    } else {
        Completion::Unknown
    }
}

/// Yes/no style participation flag; anything unrecognized or absent is
/// non-participation.
pub fn parse_flag(raw: Option<&str>) -> bool {
    match raw {
        Some(v) => TRUTHY.iter().any(|w| *w == v.trim().to_lowercase()),
        None => false,
    }
}

/// A usable title must contain at least one alphanumeric character;
/// exports carry placeholder rows of dashes and whitespace.
fn clean_title(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.chars().any(|c| c.is_alphanumeric()) {
        Some(raw.to_string())
    } else {
        None
    }
}

/// Standardize one raw row into a canonical record, or say why not.
pub fn standardize_row(
    table: &RawTable,
    map: &ColumnMap,
    row: &csv::StringRecord,
) -> Result<CanonicalRecord, RowSkip> {
    let cell = |field: Field| map.index(field).and_then(|i| table.cell(row, i));

    let video_name = clean_title(cell(Field::VideoName)).ok_or(RowSkip::MissingVideo)?;

    let ts = timestamp::reconcile(cell(Field::Timestamp), cell(Field::Date), cell(Field::Time))
        .ok_or(RowSkip::BadTimestamp)?;

    let duration_min = cell(Field::Duration)
        .and_then(parse_duration_minutes)
        .ok_or(RowSkip::InvalidDuration)?;
    if duration_min <= 0.0 {
        return Err(RowSkip::InvalidDuration);
    }

    Ok(CanonicalRecord {
        video_name,
        viewer_id: cell(Field::ViewerId).map(str::to_string),
        owner_id: cell(Field::OwnerId).map(str::to_string),
        timestamp: ts,
        duration_min,
        completion: parse_completion(cell(Field::Completion)),
        questionnaire: parse_flag(cell(Field::Questionnaire)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_normalize_to_minutes() {
        assert_eq!(parse_duration_minutes("90"), Some(1.5));
        assert_eq!(parse_duration_minutes("90 sec"), Some(1.5));
        assert_eq!(parse_duration_minutes("90s"), Some(1.5));
        assert_eq!(parse_duration_minutes("2 min"), Some(2.0));
        assert_eq!(parse_duration_minutes("1.5 minutes"), Some(1.5));
        assert_eq!(parse_duration_minutes("0.5 hr"), Some(30.0));
        assert_eq!(parse_duration_minutes("2:30"), Some(2.5));
        assert_eq!(parse_duration_minutes("1:00:30"), Some(60.5));
    }

    #[test]
    fn garbage_durations_are_rejected() {
        assert_eq!(parse_duration_minutes(""), None);
        assert_eq!(parse_duration_minutes("fast"), None);
        assert_eq!(parse_duration_minutes("90 laps"), None);
        assert_eq!(parse_duration_minutes("1:2:3:4"), None);
    }

    #[test]
    fn completion_encodings_collapse_to_three_values() {
        for v in ["yes", "Y", "TRUE", "1", "Done", "completed"] {
            assert_eq!(parse_completion(Some(v)), Completion::Completed, "{v}");
        }
        for v in ["no", "N", "false", "0", "Not Completed", "partial"] {
            assert_eq!(parse_completion(Some(v)), Completion::NotCompleted, "{v}");
        }
        assert_eq!(parse_completion(Some("100%")), Completion::Completed);
        assert_eq!(parse_completion(Some("97%")), Completion::NotCompleted);
        assert_eq!(parse_completion(Some("maybe")), Completion::Unknown);
        assert_eq!(parse_completion(Some("")), Completion::Unknown);
        assert_eq!(parse_completion(None), Completion::Unknown);
    }

    #[test]
    fn questionnaire_flag_defaults_to_false() {
        assert!(parse_flag(Some("yes")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("no")));
        assert!(!parse_flag(Some("n/a")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn placeholder_titles_are_dropped() {
        assert_eq!(clean_title(Some("Intro to Fractions")).as_deref(), Some("Intro to Fractions"));
        assert_eq!(clean_title(Some("---")), None);
        assert_eq!(clean_title(Some("   ")), None);
        assert_eq!(clean_title(None), None);
    }
}
