use chrono::{NaiveDateTime, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Standardized completion status of a single view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Completion {
    Completed,
    NotCompleted,
    Unknown,
}

impl Completion {
    pub fn label(self) -> &'static str {
        match self {
            Completion::Completed => "completed",
            Completion::NotCompleted => "not completed",
            Completion::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn label(self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

/// A row that survived normalization: valid timestamp, positive duration,
/// non-empty video name.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub video_name: String,
    pub viewer_id: Option<String>,
    pub owner_id: Option<String>,
    pub timestamp: NaiveDateTime,
    pub duration_min: f64,
    pub completion: Completion,
    pub questionnaire: bool,
}

/// Canonical record plus the fields derived from its timestamp and from
/// the viewer's position in the chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchRecord {
    pub video_name: String,
    pub viewer_id: Option<String>,
    pub owner_id: Option<String>,
    pub timestamp: NaiveDateTime,
    pub duration_min: f64,
    pub completion: Completion,
    pub questionnaire: bool,
    pub academic_year: String,
    pub year: i32,
    pub month: u32,
    pub hour: u32,
    pub weekday: Weekday,
    pub meridiem: Meridiem,
    pub repeat_viewer: bool,
}

/// Per-video aggregates used for the leaderboard.
#[derive(Debug, Clone)]
pub struct VideoStats {
    pub video_name: String,
    pub views: usize,
    pub unique_viewers: usize,
    pub avg_duration_min: f64,
    pub completion_rate: Option<f64>,
    pub repeat_share: f64,
}

/// Tally of rows seen versus kept, with one counter per exclusion reason.
/// Nothing leaves the pipeline without showing up here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub rows_total: usize,
    pub rows_kept: usize,
    pub files_skipped: usize,
    pub missing_columns: usize,
    pub bad_timestamp: usize,
    pub missing_video: usize,
    pub invalid_duration: usize,
    pub duplicates: usize,
}

impl CleanStats {
    pub fn excluded(&self) -> usize {
        self.rows_total - self.rows_kept
    }
}
