// Record and RecordStore: the corpus the pipeline runs over.
//
// A Record is built once by the importer and never changes afterwards. Its
// combined text (title, abstract and tags) is what every later stage reads.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::dedup::normalize_field;

/// Separator placed between title and abstract in the combined text.
const FIELD_SEPARATOR: &str = ". ";
/// Separator placed between tags so that no phrase spans two tags.
const TAG_SEPARATOR: &str = "; ";

/// A single bibliographic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordInput")]
pub struct Record {
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: String,
    tags: BTreeSet<String>,
    #[serde(rename = "text")]
    combined_text: String,
}

/// Wire shape accepted from importers: the combined text is always derived,
/// never trusted from input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordInput {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default, alias = "keywords")]
    pub tags: Vec<String>,
}

impl From<RecordInput> for Record {
    fn from(input: RecordInput) -> Self {
        Record::new(input.title, input.abstract_text, input.tags)
    }
}

impl Record {
    /// Build a record. Blank tags are dropped and duplicates collapse,
    /// ignoring case and whitespace.
    pub fn new<I, S>(title: impl Into<String>, abstract_text: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let title = title.into();
        let abstract_text = abstract_text.into();
        // Tags that differ only in case or spacing collapse to the first spelling
        let mut seen = HashSet::new();
        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(|t| t.into().trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(normalize_field(t)))
            .collect();

        let mut combined_text = String::with_capacity(title.len() + abstract_text.len() + 2);
        combined_text.push_str(title.trim());
        combined_text.push_str(FIELD_SEPARATOR);
        combined_text.push_str(abstract_text.trim());
        if !tags.is_empty() {
            combined_text.push_str(FIELD_SEPARATOR);
            let joined: Vec<&str> = tags.iter().map(String::as_str).collect();
            combined_text.push_str(&joined.join(TAG_SEPARATOR));
        }

        Self {
            title,
            abstract_text,
            tags,
            combined_text,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn abstract_text(&self) -> &str {
        &self.abstract_text
    }

    /// Author and database assigned keywords, in sorted order.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Title, abstract and tags joined with phrase separators.
    pub fn combined_text(&self) -> &str {
        &self.combined_text
    }
}

/// The deduplicated corpus. Row order is stable and becomes the row order
/// of the document-term matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Union of every record's tags.
    pub fn all_tags(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .flat_map(|r| r.tags.iter().map(String::as_str))
            .collect()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_text_joins_fields() {
        let record = Record::new(
            "Soil erosion mapping",
            "We map erosion with GIS.",
            vec!["GIS", "remote sensing"],
        );
        assert_eq!(
            record.combined_text(),
            "Soil erosion mapping. We map erosion with GIS.. GIS; remote sensing"
        );
    }

    #[test]
    fn test_blank_tags_dropped() {
        let record = Record::new("t", "a", vec!["  ", "x", "x", ""]);
        assert_eq!(record.tags().len(), 1);
        assert!(record.tags().contains("x"));
    }

    #[test]
    fn test_tags_differing_in_case_collapse() {
        let record = Record::new("t", "a", vec!["GIS", "gis", " Gis ", "Remote  Sensing", "remote sensing"]);
        assert_eq!(record.tags().len(), 2);
        assert!(record.tags().contains("GIS"));
        assert!(record.tags().contains("Remote  Sensing"));
        assert_eq!(record.combined_text(), "t. a. GIS; Remote  Sensing");
    }

    #[test]
    fn test_deserialize_derives_combined_text() {
        let json = r#"{"title": "A", "abstract": "B", "keywords": ["k"], "text": "ignored"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.combined_text(), "A. B. k");
    }
}
