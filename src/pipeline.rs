use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, warn};

use crate::clean::{self, RowSkip};
use crate::columns::{self, AliasTable};
use crate::derive;
use crate::ingest;
use crate::models::{CanonicalRecord, CleanStats, WatchRecord};

/// The assembled dataset both surfaces consume: derived records in
/// chronological order plus the total-vs-kept tally.
#[derive(Debug)]
pub struct Dataset {
    pub records: Vec<WatchRecord>,
    pub stats: CleanStats,
}

/// Run the full pipeline over one or more export files: ingest, column
/// resolution, row standardization, dedup, chronological sort, feature
/// derivation. A file whose columns cannot be resolved is skipped and
/// counted; an unreadable file aborts. Re-running on the same inputs
/// yields an identical dataset.
pub fn assemble(paths: &[PathBuf], aliases: &AliasTable) -> Result<Dataset> {
    let mut stats = CleanStats::default();
    let mut canonical: Vec<CanonicalRecord> = Vec::new();

    for path in paths {
        let table = ingest::read_table(path)?;
        stats.rows_total += table.rows.len();

        let map = match columns::resolve(&table.headers, aliases) {
            Ok(map) => map,
            Err(err) => {
                warn!(source = %table.source, %err, "skipping file");
                stats.files_skipped += 1;
                stats.missing_columns += table.rows.len();
                continue;
            }
        };

        for row in &table.rows {
            match clean::standardize_row(&table, &map, row) {
                Ok(record) => canonical.push(record),
                Err(RowSkip::MissingVideo) => stats.missing_video += 1,
                Err(RowSkip::BadTimestamp) => stats.bad_timestamp += 1,
                Err(RowSkip::InvalidDuration) => stats.invalid_duration += 1,
            }
        }
    }

    // exact-duplicate rows collapse to one occurrence
    let mut seen: HashSet<String> = HashSet::new();
    canonical.retain(|r| {
        let fresh = seen.insert(dedup_key(r));
        if !fresh {
            stats.duplicates += 1;
        }
        fresh
    });

    // chronological order drives the repeat-viewer flag; the full-record
    // tie-break keeps reassembly byte-identical across runs
    canonical.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.viewer_id.cmp(&b.viewer_id))
            .then_with(|| a.video_name.cmp(&b.video_name))
            .then_with(|| a.duration_min.total_cmp(&b.duration_min))
    });

    let records = derive::derive_records(canonical);
    stats.rows_kept = records.len();

    debug!(
        kept = stats.rows_kept,
        excluded = stats.excluded(),
        "assembled dataset"
    );
    Ok(Dataset { records, stats })
}

fn dedup_key(r: &CanonicalRecord) -> String {
    format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{:.6}\u{1f}{}\u{1f}{}",
        r.video_name,
        r.viewer_id.as_deref().unwrap_or(""),
        r.owner_id.as_deref().unwrap_or(""),
        r.timestamp,
        r.duration_min,
        r.completion.label(),
        r.questionnaire,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    const EXPORT: &str = "\
viewerChoices_VideoName,videoViewer,viewerChoices_ViewDate,viewerChoices_ViewTime,viewerChoices_ViewingDuration,viewerChoices_DoneViewing
Intro,s-01,2023-01-05,1:30 PM,90 sec,yes
Intro,s-01,2023-01-05,1:30 PM,90 sec,yes
Recap,s-02,2023-01-06,9:00 AM,120,no
Recap,s-02,not-a-date,9:00 AM,120,no
Ghost,s-03,2023-01-07,10:00 AM,0,yes
,s-04,2023-01-08,11:00 AM,60,yes
";

    #[test]
    fn assembles_and_accounts_for_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "watch.csv", EXPORT);

        let dataset = assemble(&[path], &AliasTable::default()).unwrap();
        let stats = dataset.stats;

        assert_eq!(stats.rows_total, 6);
        assert_eq!(stats.rows_kept, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.bad_timestamp, 1);
        assert_eq!(stats.invalid_duration, 1);
        assert_eq!(stats.missing_video, 1);
        assert_eq!(stats.excluded(), 4);

        let first = &dataset.records[0];
        assert_eq!(first.video_name, "Intro");
        assert_eq!(first.timestamp.to_string(), "2023-01-05 13:30:00");
        assert!((first.duration_min - 1.5).abs() < 1e-9);
        assert_eq!(first.hour, 13);
        assert_eq!(first.meridiem.label(), "PM");
        assert_eq!(first.completion.label(), "completed");
    }

    #[test]
    fn reassembly_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "watch.csv", EXPORT);

        let first = assemble(&[path.clone()], &AliasTable::default()).unwrap();
        let second = assemble(&[path], &AliasTable::default()).unwrap();
        assert_eq!(first.records, second.records);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn unresolvable_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "good.csv", EXPORT);
        let bad = write_file(dir.path(), "bad.csv", "a,b,c\n1,2,3\n4,5,6\n");

        let dataset = assemble(&[bad, good], &AliasTable::default()).unwrap();
        assert_eq!(dataset.stats.files_skipped, 1);
        assert_eq!(dataset.stats.missing_columns, 2);
        assert_eq!(dataset.stats.rows_total, 8);
        assert_eq!(dataset.stats.rows_kept, 2);
    }

    #[test]
    fn zero_duration_twins_are_both_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "watch.csv",
            "Video,Viewer,Date,Duration\n\
             Loop,s-01,2023-01-05,0\n\
             Loop,s-02,2023-01-06,0\n",
        );

        let dataset = assemble(&[path], &AliasTable::default()).unwrap();
        assert!(dataset.records.is_empty());
        assert_eq!(dataset.stats.invalid_duration, 2);
    }

    #[test]
    fn multiple_sources_concatenate() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(
            dir.path(),
            "a.csv",
            "Video,Viewer,Date\nIntro,s-01,2023-01-05\n",
        );
        let b = write_file(
            dir.path(),
            "b.csv",
            "Title,Student,Watch Date,Duration\nRecap,s-01,2023-02-01,30\n",
        );

        let dataset = assemble(&[a, b], &AliasTable::default()).unwrap();
        // file `a` has no duration column, so its row fails the
        // positive-duration invariant; file `b` survives
        assert_eq!(dataset.stats.rows_total, 2);
        assert_eq!(dataset.stats.invalid_duration, 1);
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].video_name, "Recap");
        assert!(!dataset.records[0].repeat_viewer);
    }
}
