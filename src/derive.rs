use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Timelike};

use crate::models::{CanonicalRecord, Completion, VideoStats, WatchRecord};
use crate::timestamp;

/// Academic-year label for a date, with the year rolling over on
/// August 1: Sep 2023 and Feb 2024 both label "2023-2024".
pub fn academic_year(date: NaiveDate) -> String {
    let start = if date.month() >= 8 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{}", start, start + 1)
}

/// Expand canonical records into watch records. Input must already be in
/// chronological order: the repeat-viewer flag marks every record of a
/// viewer after their first.
pub fn derive_records(records: Vec<CanonicalRecord>) -> Vec<WatchRecord> {
    let mut seen: HashSet<String> = HashSet::new();

    records
        .into_iter()
        .map(|r| {
            let repeat_viewer = match &r.viewer_id {
                Some(viewer) => !seen.insert(viewer.clone()),
                None => false,
            };
            WatchRecord {
                academic_year: academic_year(r.timestamp.date()),
                year: r.timestamp.year(),
                month: r.timestamp.month(),
                hour: r.timestamp.hour(),
                weekday: r.timestamp.weekday(),
                meridiem: timestamp::meridiem_of(r.timestamp),
                repeat_viewer,
                video_name: r.video_name,
                viewer_id: r.viewer_id,
                owner_id: r.owner_id,
                timestamp: r.timestamp,
                duration_min: r.duration_min,
                completion: r.completion,
                questionnaire: r.questionnaire,
            }
        })
        .collect()
}

/// Per-video aggregates: view count, distinct viewers, average duration,
/// completion rate over known statuses, share of repeat views.
pub fn video_stats(records: &[WatchRecord]) -> Vec<VideoStats> {
    #[derive(Default)]
    struct Acc {
        views: usize,
        viewers: HashSet<String>,
        duration_sum: f64,
        completed: usize,
        known_completion: usize,
        repeats: usize,
    }

    let mut by_video: HashMap<&str, Acc> = HashMap::new();
    for r in records {
        let acc = by_video.entry(r.video_name.as_str()).or_default();
        acc.views += 1;
        if let Some(v) = &r.viewer_id {
            acc.viewers.insert(v.clone());
        }
        acc.duration_sum += r.duration_min;
        match r.completion {
            Completion::Completed => {
                acc.completed += 1;
                acc.known_completion += 1;
            }
            Completion::NotCompleted => acc.known_completion += 1,
            Completion::Unknown => {}
        }
        if r.repeat_viewer {
            acc.repeats += 1;
        }
    }

    let mut stats: Vec<VideoStats> = by_video
        .into_iter()
        .map(|(name, acc)| VideoStats {
            video_name: name.to_string(),
            views: acc.views,
            unique_viewers: acc.viewers.len(),
            avg_duration_min: acc.duration_sum / acc.views as f64,
            completion_rate: (acc.known_completion > 0)
                .then(|| acc.completed as f64 / acc.known_completion as f64),
            repeat_share: acc.repeats as f64 / acc.views as f64,
        })
        .collect();

    // most-viewed first; name breaks ties so ranking is stable
    stats.sort_by(|a, b| b.views.cmp(&a.views).then(a.video_name.cmp(&b.video_name)));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Meridiem;
    use chrono::{NaiveDate, Weekday};

    fn canonical(video: &str, viewer: Option<&str>, day: u32, hour: u32) -> CanonicalRecord {
        CanonicalRecord {
            video_name: video.to_string(),
            viewer_id: viewer.map(str::to_string),
            owner_id: None,
            timestamp: NaiveDate::from_ymd_opt(2023, 9, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            duration_min: 2.0,
            completion: Completion::Completed,
            questionnaire: false,
        }
    }

    #[test]
    fn academic_year_rolls_over_in_august() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(academic_year(d(2023, 9, 15)), "2023-2024");
        assert_eq!(academic_year(d(2024, 2, 10)), "2023-2024");
        assert_eq!(academic_year(d(2024, 7, 31)), "2023-2024");
        assert_eq!(academic_year(d(2024, 8, 1)), "2024-2025");
    }

    #[test]
    fn calendar_fields_come_from_the_timestamp() {
        let derived = derive_records(vec![canonical("Intro", Some("s-01"), 4, 13)]);
        let r = &derived[0];
        assert_eq!(r.year, 2023);
        assert_eq!(r.month, 9);
        assert_eq!(r.hour, 13);
        assert_eq!(r.weekday, Weekday::Mon);
        assert_eq!(r.meridiem, Meridiem::Pm);
        assert_eq!(r.academic_year, "2023-2024");
    }

    #[test]
    fn nth_record_of_a_viewer_is_repeat_iff_n_gt_1() {
        let derived = derive_records(vec![
            canonical("A", Some("s-01"), 1, 9),
            canonical("B", Some("s-02"), 2, 9),
            canonical("C", Some("s-01"), 3, 9),
            canonical("D", Some("s-01"), 4, 9),
            canonical("E", None, 5, 9),
        ]);
        let flags: Vec<bool> = derived.iter().map(|r| r.repeat_viewer).collect();
        assert_eq!(flags, vec![false, false, true, true, false]);
    }

    #[test]
    fn video_stats_aggregate_and_rank() {
        let mut records = derive_records(vec![
            canonical("Intro", Some("s-01"), 1, 9),
            canonical("Intro", Some("s-02"), 2, 9),
            canonical("Intro", Some("s-01"), 3, 9),
            canonical("Recap", Some("s-03"), 4, 9),
        ]);
        records[3].completion = Completion::Unknown;

        let stats = video_stats(&records);
        assert_eq!(stats.len(), 2);

        let intro = &stats[0];
        assert_eq!(intro.video_name, "Intro");
        assert_eq!(intro.views, 3);
        assert_eq!(intro.unique_viewers, 2);
        assert!((intro.avg_duration_min - 2.0).abs() < 1e-9);
        assert_eq!(intro.completion_rate, Some(1.0));
        assert!((intro.repeat_share - 1.0 / 3.0).abs() < 1e-9);

        let recap = &stats[1];
        assert_eq!(recap.views, 1);
        assert_eq!(recap.completion_rate, None);
    }
}
