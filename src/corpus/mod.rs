// Corpus handling: immutable records, the record store and deduplication.
//
// Parsing of bibliographic export formats lives outside this crate. What
// arrives here is a JSON (or JSON Lines) dump of already-normalized
// records: `{"title": ..., "abstract": ..., "tags": [...]}`.

pub mod dedup;
pub mod record;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use record::{Record, RecordInput};

/// Load records from a JSON array or a JSON Lines file.
///
/// Blank lines in JSON Lines input are skipped. A line that fails to parse
/// aborts the load: partial corpora are never returned.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    let records = parse_records(&raw)
        .with_context(|| format!("Failed to parse records in {}", path.display()))?;

    if records.is_empty() {
        warn!(path = %path.display(), "Record file contains no records");
    }
    info!(count = records.len(), path = %path.display(), "Loaded records");
    Ok(records)
}

/// Parse records from an in-memory string (JSON array or JSON Lines).
pub fn parse_records(raw: &str) -> Result<Vec<Record>> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        let inputs: Vec<RecordInput> = serde_json::from_str(trimmed)?;
        return Ok(inputs.into_iter().map(Record::from).collect());
    }

    let mut records = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let input: RecordInput = serde_json::from_str(line)
            .with_context(|| format!("Invalid record on line {}", line_no + 1))?;
        records.push(Record::from(input));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let raw = r#"[{"title": "A", "abstract": "x"}, {"title": "B", "tags": ["t"]}]"#;
        let records = parse_records(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tags().len(), 1);
    }

    #[test]
    fn test_parse_json_lines_skips_blank() {
        let raw = "{\"title\": \"A\"}\n\n{\"title\": \"B\"}\n";
        let records = parse_records(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].abstract_text(), "");
    }

    #[test]
    fn test_parse_json_lines_reports_line() {
        let raw = "{\"title\": \"A\"}\nnot json\n";
        let err = parse_records(raw).unwrap_err();
        assert!(err.to_string().contains("line 2"), "got: {err}");
    }
}
