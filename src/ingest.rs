use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::info;

/// One source file read into memory: trimmed headers plus raw string rows.
/// No interpretation happens here; column meaning is resolved later.
#[derive(Debug)]
pub struct RawTable {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    /// Cell at `col` for `row`, None when the row is shorter than the
    /// header (exports pad unevenly) or the cell is empty.
    pub fn cell<'a>(&self, row: &'a StringRecord, col: usize) -> Option<&'a str> {
        row.get(col).map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Read a spreadsheet export. An unreadable file is the one fatal error
/// in the pipeline; everything downstream degrades row by row.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read header row of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.with_context(|| format!("failed to read row from {}", path.display()))?;
        rows.push(record);
    }

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    info!(source = %source, rows = rows.len(), "loaded source file");

    Ok(RawTable {
        source,
        headers,
        rows,
    })
}
