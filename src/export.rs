use std::path::Path;

use anyhow::{Context, Result};

use crate::models::WatchRecord;

/// Header row of the export, matching the canonical field names.
const HEADERS: [&str; 14] = [
    "video_name",
    "viewer_id",
    "owner_id",
    "timestamp",
    "duration_min",
    "completion",
    "questionnaire",
    "academic_year",
    "year",
    "month",
    "hour",
    "weekday",
    "meridiem",
    "repeat_viewer",
];

/// Write the filtered table as CSV. Row count equals the filtered total
/// the summary reports for the same slice.
pub fn write_csv(records: &[WatchRecord], path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(HEADERS).context("writing header row")?;
    for r in records {
        let timestamp = r.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();
        let duration = format!("{:.4}", r.duration_min);
        let year = r.year.to_string();
        let month = r.month.to_string();
        let hour = r.hour.to_string();
        let weekday = r.weekday.to_string();
        writer
            .write_record([
                r.video_name.as_str(),
                r.viewer_id.as_deref().unwrap_or(""),
                r.owner_id.as_deref().unwrap_or(""),
                timestamp.as_str(),
                duration.as_str(),
                r.completion.label(),
                if r.questionnaire { "true" } else { "false" },
                r.academic_year.as_str(),
                year.as_str(),
                month.as_str(),
                hour.as_str(),
                weekday.as_str(),
                r.meridiem.label(),
                if r.repeat_viewer { "true" } else { "false" },
            ])
            .context("writing record")?;
    }
    writer.flush().context("flushing export")?;

    Ok(records.len())
}
