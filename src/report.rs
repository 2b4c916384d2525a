use std::fmt::Write;

use crate::filter::FilterParams;
use crate::metrics::{self, WEEKDAYS};
use crate::models::{CleanStats, Completion, WatchRecord};

fn fmt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}%", r * 100.0),
        None => "n/a".to_string(),
    }
}

fn fmt_minutes(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}

/// Render the full engagement report for a filtered slice: data quality,
/// KPIs, trends, leaderboard, completion mix, heatmap, repeat viewing.
pub fn build_report(
    filters: &FilterParams,
    stats: &CleanStats,
    records: &[WatchRecord],
) -> String {
    let mut out = String::new();
    let summary = metrics::summarize(records);

    let _ = writeln!(out, "# FreeFuse Engagement Report");
    let _ = writeln!(out, "Scope: {}", filters.describe());
    let _ = writeln!(out);

    let _ = writeln!(out, "## Data Quality");
    let _ = writeln!(
        out,
        "Kept {} of {} source rows ({} excluded).",
        stats.rows_kept,
        stats.rows_total,
        stats.excluded()
    );
    if stats.files_skipped > 0 {
        let _ = writeln!(
            out,
            "- {} file(s) skipped for missing required columns ({} rows)",
            stats.files_skipped, stats.missing_columns
        );
    }
    if stats.bad_timestamp > 0 {
        let _ = writeln!(out, "- {} rows with unparseable timestamps", stats.bad_timestamp);
    }
    if stats.missing_video > 0 {
        let _ = writeln!(out, "- {} rows without a video name", stats.missing_video);
    }
    if stats.invalid_duration > 0 {
        let _ = writeln!(out, "- {} rows with invalid durations", stats.invalid_duration);
    }
    if stats.duplicates > 0 {
        let _ = writeln!(out, "- {} duplicate rows collapsed", stats.duplicates);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Key Metrics");
    if records.is_empty() {
        let _ = writeln!(out, "No records match the current filters.");
        return out;
    }
    let _ = writeln!(out, "- Total views: {}", summary.total_views);
    let _ = writeln!(out, "- Unique viewers: {}", summary.unique_viewers);
    let _ = writeln!(out, "- Videos watched: {}", summary.videos_watched);
    let _ = writeln!(
        out,
        "- Avg duration (min): {}",
        fmt_minutes(summary.avg_duration_min)
    );
    let _ = writeln!(
        out,
        "- Median duration (min): {}",
        fmt_minutes(summary.median_duration_min)
    );
    let _ = writeln!(out, "- Completion rate: {}", fmt_rate(summary.completion_rate));
    let _ = writeln!(out, "- Repeat view rate: {}", fmt_rate(summary.repeat_rate));
    let _ = writeln!(
        out,
        "- Questionnaire participation: {}",
        fmt_rate(summary.questionnaire_rate)
    );
    if let Some((month, views)) = &summary.peak_month {
        let _ = writeln!(out, "- Peak month: {month} with {views} views");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Monthly Trend");
    let _ = writeln!(out, "| Month | Views | Unique viewers | Avg duration (min) |");
    let _ = writeln!(out, "|---|---|---|---|");
    for row in metrics::monthly_trend(records) {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.2} |",
            row.month, row.views, row.unique_viewers, row.avg_duration_min
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Daily Views");
    let _ = writeln!(out, "| Date | Views |");
    let _ = writeln!(out, "|---|---|");
    for (date, views) in metrics::daily_views(records) {
        let _ = writeln!(out, "| {date} | {views} |");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Top Videos");
    let _ = writeln!(
        out,
        "| Video | Views | Unique viewers | Avg duration (min) | Completion | Repeat share |"
    );
    let _ = writeln!(out, "|---|---|---|---|---|---|");
    for video in crate::derive::video_stats(records).into_iter().take(10) {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.2} | {} | {:.1}% |",
            video.video_name,
            video.views,
            video.unique_viewers,
            video.avg_duration_min,
            fmt_rate(video.completion_rate),
            video.repeat_share * 100.0
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Duration Distribution (min)");
    if let Some([min, q25, median, q75, max]) = metrics::duration_spread(records) {
        let _ = writeln!(out, "| Min | Q25 | Median | Q75 | Max |");
        let _ = writeln!(out, "|---|---|---|---|---|");
        let _ = writeln!(
            out,
            "| {min:.2} | {q25:.2} | {median:.2} | {q75:.2} | {max:.2} |"
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Completion Breakdown");
    for status in [
        Completion::Completed,
        Completion::NotCompleted,
        Completion::Unknown,
    ] {
        let count = records.iter().filter(|r| r.completion == status).count();
        let _ = writeln!(out, "- {}: {}", status.label(), count);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Engagement Heatmap (views per day x hour)");
    let grid = metrics::hour_weekday_heatmap(records);
    let _ = write!(out, "| Day |");
    for hour in 0..24 {
        let _ = write!(out, " {hour} |");
    }
    let _ = writeln!(out);
    let _ = write!(out, "|---|");
    for _ in 0..24 {
        let _ = write!(out, "---|");
    }
    let _ = writeln!(out);
    for (i, day) in WEEKDAYS.iter().enumerate() {
        let _ = write!(out, "| {day} |");
        for hour in 0..24 {
            let _ = write!(out, " {} |", grid[i][hour]);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Repeat Viewing");
    let repeats = records.iter().filter(|r| r.repeat_viewer).count();
    let _ = writeln!(
        out,
        "{} of {} views came from viewers seen earlier in the period ({}).",
        repeats,
        records.len(),
        fmt_rate(summary.repeat_rate)
    );

    out
}
