use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, Weekday};

use crate::models::{Completion, WatchRecord};

/// The KPI panel: everything the metric row of the dashboards shows,
/// recomputed from whichever filtered slice is active.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementSummary {
    pub total_views: usize,
    pub unique_viewers: usize,
    pub videos_watched: usize,
    pub avg_duration_min: Option<f64>,
    pub median_duration_min: Option<f64>,
    pub completion_rate: Option<f64>,
    pub repeat_rate: Option<f64>,
    pub questionnaire_rate: Option<f64>,
    /// Month with the most views, as ("YYYY-MM", views).
    pub peak_month: Option<(String, usize)>,
}

/// One row of the monthly trend table.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTrend {
    pub month: String,
    pub views: usize,
    pub unique_viewers: usize,
    pub avg_duration_min: f64,
}

pub fn summarize(records: &[WatchRecord]) -> EngagementSummary {
    let total_views = records.len();

    let unique_viewers = records
        .iter()
        .filter_map(|r| r.viewer_id.as_deref())
        .collect::<HashSet<_>>()
        .len();
    let videos_watched = records
        .iter()
        .map(|r| r.video_name.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut durations: Vec<f64> = records.iter().map(|r| r.duration_min).collect();
    durations.sort_by(f64::total_cmp);
    let avg_duration_min =
        (!durations.is_empty()).then(|| durations.iter().sum::<f64>() / durations.len() as f64);
    let median_duration_min = median(&durations);

    let completed = records
        .iter()
        .filter(|r| r.completion == Completion::Completed)
        .count();
    let known = records
        .iter()
        .filter(|r| r.completion != Completion::Unknown)
        .count();
    let completion_rate = (known > 0).then(|| completed as f64 / known as f64);

    let repeats = records.iter().filter(|r| r.repeat_viewer).count();
    let repeat_rate = (total_views > 0).then(|| repeats as f64 / total_views as f64);

    let participants = records.iter().filter(|r| r.questionnaire).count();
    let questionnaire_rate = (total_views > 0).then(|| participants as f64 / total_views as f64);

    let peak_month = monthly_trend(records)
        .into_iter()
        .max_by(|a, b| a.views.cmp(&b.views).then(b.month.cmp(&a.month)))
        .map(|m| (m.month, m.views));

    EngagementSummary {
        total_views,
        unique_viewers,
        videos_watched,
        avg_duration_min,
        median_duration_min,
        completion_rate,
        repeat_rate,
        questionnaire_rate,
        peak_month,
    }
}

fn median(sorted: &[f64]) -> Option<f64> {
    match sorted.len() {
        0 => None,
        n if n % 2 == 1 => Some(sorted[n / 2]),
        n => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// Five-number summary of durations (min, q25, median, q75, max),
/// linearly interpolated. Feeds the distribution section of the report.
pub fn duration_spread(records: &[WatchRecord]) -> Option<[f64; 5]> {
    if records.is_empty() {
        return None;
    }
    let mut durations: Vec<f64> = records.iter().map(|r| r.duration_min).collect();
    durations.sort_by(f64::total_cmp);

    let quantile = |q: f64| -> f64 {
        let pos = q * (durations.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        durations[lo] + (durations[hi] - durations[lo]) * (pos - lo as f64)
    };

    Some([
        durations[0],
        quantile(0.25),
        quantile(0.5),
        quantile(0.75),
        durations[durations.len() - 1],
    ])
}

/// Views, unique viewers, and average duration per "YYYY-MM", ascending.
pub fn monthly_trend(records: &[WatchRecord]) -> Vec<MonthlyTrend> {
    let mut by_month: BTreeMap<String, (usize, HashSet<&str>, f64)> = BTreeMap::new();
    for r in records {
        let key = format!("{:04}-{:02}", r.year, r.month);
        let entry = by_month.entry(key).or_default();
        entry.0 += 1;
        if let Some(v) = r.viewer_id.as_deref() {
            entry.1.insert(v);
        }
        entry.2 += r.duration_min;
    }

    by_month
        .into_iter()
        .map(|(month, (views, viewers, duration_sum))| MonthlyTrend {
            month,
            views,
            unique_viewers: viewers.len(),
            avg_duration_min: duration_sum / views as f64,
        })
        .collect()
}

/// Daily view counts, ascending by date.
pub fn daily_views(records: &[WatchRecord]) -> Vec<(NaiveDate, usize)> {
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for r in records {
        *by_day.entry(r.timestamp.date()).or_default() += 1;
    }
    by_day.into_iter().collect()
}

/// Monday-first ordering for heatmap rows and report tables.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// View counts in a 7x24 grid: `grid[weekday][hour]`, Monday first.
pub fn hour_weekday_heatmap(records: &[WatchRecord]) -> [[usize; 24]; 7] {
    let mut grid = [[0usize; 24]; 7];
    for r in records {
        grid[r.weekday.num_days_from_monday() as usize][r.hour as usize] += 1;
    }
    grid
}
