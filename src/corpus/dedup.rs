// Exact-key deduplication of imported records.
//
// Two records are duplicates when every configured field matches after
// normalization (trim, case-fold, collapse internal whitespace). The first
// occurrence wins and input order is preserved.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::record::{Record, RecordStore};

/// A record field that can take part in the deduplication key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupField {
    Title,
    Abstract,
    Tags,
    /// The combined text (title, abstract and tags)
    Text,
}

impl DedupField {
    /// Default key: title and abstract.
    pub fn defaults() -> Vec<DedupField> {
        vec![DedupField::Title, DedupField::Abstract]
    }

    fn key_part(self, record: &Record) -> String {
        match self {
            DedupField::Title => normalize_field(record.title()),
            DedupField::Abstract => normalize_field(record.abstract_text()),
            DedupField::Text => normalize_field(record.combined_text()),
            DedupField::Tags => {
                let mut tags: Vec<String> = record.tags().iter().map(|t| normalize_field(t)).collect();
                tags.sort();
                tags.dedup();
                tags.join("\u{1f}")
            }
        }
    }
}

impl fmt::Display for DedupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DedupField::Title => "title",
            DedupField::Abstract => "abstract",
            DedupField::Tags => "tags",
            DedupField::Text => "text",
        };
        f.write_str(name)
    }
}

impl FromStr for DedupField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(DedupField::Title),
            "abstract" => Ok(DedupField::Abstract),
            "tags" | "keywords" => Ok(DedupField::Tags),
            "text" => Ok(DedupField::Text),
            other => Err(format!(
                "unknown dedup column '{other}' (expected title, abstract, tags or text)"
            )),
        }
    }
}

/// Trim, case-fold and collapse runs of whitespace to a single space.
pub fn normalize_field(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove records whose key over `fields` matches an earlier record.
pub fn deduplicate(records: Vec<Record>, fields: &[DedupField]) -> RecordStore {
    let before = records.len();
    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(before);

    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| {
            let key: Vec<String> = fields.iter().map(|f| f.key_part(record)).collect();
            seen.insert(key)
        })
        .collect();

    debug!(
        before,
        after = kept.len(),
        removed = before - kept.len(),
        "Deduplicated records"
    );

    RecordStore::from_records(kept)
}
