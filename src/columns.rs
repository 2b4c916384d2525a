use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Canonical fields of the watch-history schema. Raw exports name these
/// columns inconsistently; resolution maps each header onto at most one
/// of them and drops the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    VideoName,
    ViewerId,
    OwnerId,
    Date,
    Time,
    Timestamp,
    Duration,
    Completion,
    Questionnaire,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::VideoName,
        Field::ViewerId,
        Field::OwnerId,
        Field::Date,
        Field::Time,
        Field::Timestamp,
        Field::Duration,
        Field::Completion,
        Field::Questionnaire,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::VideoName => "video_name",
            Field::ViewerId => "viewer_id",
            Field::OwnerId => "owner_id",
            Field::Date => "date",
            Field::Time => "time",
            Field::Timestamp => "timestamp",
            Field::Duration => "duration",
            Field::Completion => "completion",
            Field::Questionnaire => "questionnaire",
        }
    }

    fn from_key(key: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Built-in aliases, seeded from the column names seen across the
    /// FreeFuse exports (2022-2024 school years).
    fn builtin_aliases(self) -> &'static [&'static str] {
        match self {
            Field::VideoName => &[
                "viewerchoices_videoname",
                "video_name",
                "videoname",
                "video_title",
                "video",
                "title",
            ],
            Field::ViewerId => &[
                "videoviewer",
                "viewer_id",
                "viewer",
                "user_id",
                "user",
                "student_id",
                "student",
            ],
            Field::OwnerId => &["videoowner", "owner_id", "owner", "instructor"],
            Field::Date => &[
                "viewerchoices_viewdate",
                "view_date",
                "viewdate",
                "watch_date",
                "date",
            ],
            Field::Time => &[
                "viewerchoices_viewtime",
                "view_time",
                "viewtime",
                "watch_time",
                "time",
            ],
            Field::Timestamp => &[
                "view_timestamp",
                "timestamp",
                "datetime",
                "date_time",
                "viewed_at",
                "watched_at",
            ],
            Field::Duration => &[
                "viewerchoices_viewingduration",
                "viewing_duration_sec",
                "viewingduration",
                "duration_seconds",
                "duration_sec",
                "viewing_duration",
                "watch_duration",
                "duration",
            ],
            Field::Completion => &[
                "viewerchoices_doneviewing",
                "done_viewing",
                "completion_status",
                "completion",
                "completed",
                "finished",
                "done",
            ],
            Field::Questionnaire => &[
                "questionnaire_response",
                "questionnaire_completed",
                "questionnaire",
                "survey_response",
                "survey",
                "responded",
            ],
        }
    }
}

/// Collapse a header to its comparable form: lowercase, alphanumerics only.
/// "Video Name", "video_name" and "VideoName" all land on "videoname".
pub fn normalize(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Alias table: canonical field -> accepted raw names (normalized form).
#[derive(Debug, Clone)]
pub struct AliasTable {
    aliases: HashMap<Field, Vec<String>>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let aliases = Field::ALL
            .iter()
            .map(|&field| {
                let names = field
                    .builtin_aliases()
                    .iter()
                    .map(|a| normalize(a))
                    .collect();
                (field, names)
            })
            .collect();
        AliasTable { aliases }
    }
}

impl AliasTable {
    /// Merge extra aliases from a JSON file of the shape
    /// `{"video_name": ["clip title"], ...}`. Overrides take precedence
    /// over the built-ins within their field.
    pub fn with_overrides(mut self, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read alias file {}", path.display()))?;
        let overrides: HashMap<String, Vec<String>> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid alias file {}", path.display()))?;

        for (key, names) in overrides {
            let field = Field::from_key(&key)
                .with_context(|| format!("unknown canonical field {key:?} in alias file"))?;
            let entry = self.aliases.entry(field).or_default();
            for (i, name) in names.iter().enumerate() {
                entry.insert(i, normalize(name));
            }
        }
        Ok(self)
    }

    fn aliases_for(&self, field: Field) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Resolved mapping from canonical fields to column indices of one table.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<Field, usize>,
}

impl ColumnMap {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }
}

/// Match each canonical field against the headers: an exact pass over all
/// fields first (normalized equality), then a containment pass for the
/// fields still unmatched, each in alias order. A column is claimed by at
/// most one field. Fails when the table has no video-name column or no
/// timestamp source (timestamp or date).
pub fn resolve(headers: &[String], table: &AliasTable) -> Result<ColumnMap> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    let mut claimed = vec![false; headers.len()];
    let mut map = ColumnMap::default();

    for &field in &Field::ALL {
        let hit = table.aliases_for(field).iter().find_map(|alias| {
            (0..normalized.len()).find(|&i| !claimed[i] && normalized[i] == *alias)
        });
        if let Some(i) = hit {
            claimed[i] = true;
            map.indices.insert(field, i);
        }
    }

    for &field in &Field::ALL {
        if map.index(field).is_some() {
            continue;
        }
        let hit = table.aliases_for(field).iter().find_map(|alias| {
            (0..normalized.len()).find(|&i| {
                !claimed[i] && !normalized[i].is_empty() && normalized[i].contains(alias.as_str())
            })
        });
        if let Some(i) = hit {
            claimed[i] = true;
            map.indices.insert(field, i);
        }
    }

    if map.index(Field::VideoName).is_none() {
        bail!("no column matches the video name field");
    }
    if map.index(Field::Timestamp).is_none() && map.index(Field::Date).is_none() {
        bail!("no column matches a timestamp source (timestamp or date)");
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalizes_case_whitespace_and_punctuation() {
        assert_eq!(normalize(" Video Name "), "videoname");
        assert_eq!(normalize("viewerChoices_VideoName"), "viewerchoicesvideoname");
        assert_eq!(normalize("DONE-VIEWING"), "doneviewing");
    }

    #[test]
    fn resolves_export_headers() {
        let table = AliasTable::default();
        let map = resolve(
            &headers(&[
                "viewerChoices_VideoName",
                "videoViewer",
                "videoOwner",
                "viewerChoices_ViewDate",
                "viewerChoices_ViewTime",
                "viewerChoices_ViewingDuration",
                "viewerChoices_DoneViewing",
            ]),
            &table,
        )
        .unwrap();

        assert_eq!(map.index(Field::VideoName), Some(0));
        assert_eq!(map.index(Field::ViewerId), Some(1));
        assert_eq!(map.index(Field::OwnerId), Some(2));
        assert_eq!(map.index(Field::Date), Some(3));
        assert_eq!(map.index(Field::Time), Some(4));
        assert_eq!(map.index(Field::Duration), Some(5));
        assert_eq!(map.index(Field::Completion), Some(6));
        assert_eq!(map.index(Field::Questionnaire), None);
    }

    #[test]
    fn exact_match_beats_containment() {
        let table = AliasTable::default();
        // "Watch Date Notes" contains "watchdate" but "Date" matches exactly.
        let map = resolve(&headers(&["Video", "Watch Date Notes", "Date"]), &table).unwrap();
        assert_eq!(map.index(Field::Date), Some(2));
    }

    #[test]
    fn a_column_is_claimed_once() {
        let table = AliasTable::default();
        // One "Date" column must not serve as both date and time.
        let map = resolve(&headers(&["Title", "Date"]), &table).unwrap();
        assert_eq!(map.index(Field::Date), Some(1));
        assert_eq!(map.index(Field::Time), None);
    }

    #[test]
    fn unmatched_required_fields_fail() {
        let table = AliasTable::default();
        let err = resolve(&headers(&["Date", "Duration"]), &table).unwrap_err();
        assert!(err.to_string().contains("video name"));

        let err = resolve(&headers(&["Video", "Duration"]), &table).unwrap_err();
        assert!(err.to_string().contains("timestamp source"));
    }

    #[test]
    fn override_file_extends_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        std::fs::write(&path, r#"{"video_name": ["clip label"]}"#).unwrap();

        let table = AliasTable::default().with_overrides(&path).unwrap();
        let map = resolve(&headers(&["Clip Label", "View Date"]), &table).unwrap();
        assert_eq!(map.index(Field::VideoName), Some(0));
    }

    #[test]
    fn unknown_override_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        std::fs::write(&path, r#"{"frame_rate": ["fps"]}"#).unwrap();
        assert!(AliasTable::default().with_overrides(&path).is_err());
    }
}
