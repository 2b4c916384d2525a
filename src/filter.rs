use chrono::NaiveDate;

use crate::models::{Completion, Meridiem, WatchRecord};

/// Active filter set. Every populated field narrows the table; fields
/// compose as an intersection. An empty set passes everything through.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub hour: Option<u32>,
    pub meridiem: Option<Meridiem>,
    pub academic_year: Option<String>,
    pub videos: Vec<String>,
    pub completion: Option<Completion>,
    pub questionnaire: Option<bool>,
}

impl FilterParams {
    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.hour.is_none()
            && self.meridiem.is_none()
            && self.academic_year.is_none()
            && self.videos.is_empty()
            && self.completion.is_none()
            && self.questionnaire.is_none()
    }

    /// Human-readable description of the active filters for report and
    /// summary headers.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match (self.from, self.to) {
            (Some(a), Some(b)) => parts.push(format!("dates {a} to {b}")),
            (Some(a), None) => parts.push(format!("dates from {a}")),
            (None, Some(b)) => parts.push(format!("dates up to {b}")),
            (None, None) => {}
        }
        if let Some(h) = self.hour {
            parts.push(format!("hour {h}"));
        }
        if let Some(m) = self.meridiem {
            parts.push(m.label().to_string());
        }
        if let Some(y) = &self.academic_year {
            parts.push(format!("academic year {y}"));
        }
        if !self.videos.is_empty() {
            parts.push(format!("videos [{}]", self.videos.join(", ")));
        }
        if let Some(c) = self.completion {
            parts.push(c.label().to_string());
        }
        if let Some(q) = self.questionnaire {
            parts.push(if q {
                "questionnaire participants".to_string()
            } else {
                "questionnaire non-participants".to_string()
            });
        }
        if parts.is_empty() {
            "all records".to_string()
        } else {
            parts.join(", ")
        }
    }

    fn matches(&self, r: &WatchRecord) -> bool {
        let date = r.timestamp.date();
        if self.from.is_some_and(|a| date < a) || self.to.is_some_and(|b| date > b) {
            return false;
        }
        if self.hour.is_some_and(|h| r.hour != h) {
            return false;
        }
        if self.meridiem.is_some_and(|m| r.meridiem != m) {
            return false;
        }
        if self
            .academic_year
            .as_ref()
            .is_some_and(|y| r.academic_year != *y)
        {
            return false;
        }
        if !self.videos.is_empty() && !self.videos.iter().any(|v| *v == r.video_name) {
            return false;
        }
        if self.completion.is_some_and(|c| r.completion != c) {
            return false;
        }
        if self.questionnaire.is_some_and(|q| r.questionnaire != q) {
            return false;
        }
        true
    }
}

/// Narrow the assembled table. Pure: the dataset is untouched and the
/// result is a fresh vector, re-derived on every interaction.
pub fn apply(records: &[WatchRecord], params: &FilterParams) -> Vec<WatchRecord> {
    records
        .iter()
        .filter(|r| params.matches(r))
        .cloned()
        .collect()
}
