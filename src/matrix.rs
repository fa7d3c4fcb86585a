// Sparse document-term matrix.
//
// Rows are records in RecordStore order, columns are the terms that occur
// in at least one record, in sorted term order. Storage is Compressed Sparse
// Row: `row_offsets[d]..row_offsets[d + 1]` indexes the (column, count)
// entries of document `d`, with columns ascending inside a row.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::corpus::record::RecordStore;
use crate::error::{KeywordError, LitkeysResult, Stage};
use crate::terms::{tokenize, Vocabulary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentTermMatrix {
    /// Column labels, sorted
    terms: Vec<String>,
    /// Offsets into `columns`/`counts`. Size = rows + 1
    row_offsets: Vec<usize>,
    columns: Vec<usize>,
    counts: Vec<u32>,
}

impl DocumentTermMatrix {
    pub fn n_docs(&self) -> usize {
        self.row_offsets.len() - 1
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// Number of stored (nonzero) entries.
    pub fn nnz(&self) -> usize {
        self.counts.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn term(&self, column: usize) -> &str {
        &self.terms[column]
    }

    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }

    /// Nonzero (column, count) entries of one document, columns ascending.
    pub fn row(&self, doc: usize) -> impl Iterator<Item = (usize, u32)> + '_ {
        let start = self.row_offsets[doc];
        let end = self.row_offsets[doc + 1];
        self.columns[start..end]
            .iter()
            .copied()
            .zip(self.counts[start..end].iter().copied())
    }

    /// M[doc, column]; zero when the entry is not stored.
    pub fn get(&self, doc: usize, column: usize) -> u32 {
        let start = self.row_offsets[doc];
        let end = self.row_offsets[doc + 1];
        match self.columns[start..end].binary_search(&column) {
            Ok(pos) => self.counts[start + pos],
            Err(_) => 0,
        }
    }

    /// Number of documents each term occurs in.
    pub fn document_frequencies(&self) -> Vec<usize> {
        let mut df = vec![0usize; self.terms.len()];
        for &col in &self.columns {
            df[col] += 1;
        }
        df
    }
}

/// Builds a DocumentTermMatrix from a record store and a vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DtmBuilder {
    /// Store 1 for any occurrence instead of the count
    pub presence_only: bool,
}

impl DtmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presence_only(mut self, presence_only: bool) -> Self {
        self.presence_only = presence_only;
        self
    }

    /// Count every vocabulary term in every record's combined text.
    ///
    /// A term matches where its tokens appear contiguously inside one phrase.
    /// Matches of the same term never overlap: the scan goes left to right
    /// and resumes after the end of each match.
    pub fn build(&self, store: &RecordStore, vocabulary: &Vocabulary) -> LitkeysResult<DocumentTermMatrix> {
        if vocabulary.is_empty() {
            return Err(KeywordError::empty_vocabulary(
                Stage::DocumentTermMatrix,
                "no terms survived extraction and length filtering",
            ));
        }

        // Vocabulary index, keyed by the term's token sequence joined by spaces
        let vocab_terms: Vec<&str> = vocabulary.iter().collect();
        let index: HashMap<&str, usize> = vocab_terms
            .iter()
            .enumerate()
            .map(|(i, t)| (*t, i))
            .collect();
        let max_tokens = vocab_terms
            .iter()
            .map(|t| t.split(' ').count())
            .max()
            .unwrap_or(1);

        // Per-document sparse counts over full-vocabulary indices
        let mut rows: Vec<Vec<(usize, u32)>> = Vec::with_capacity(store.len());
        for record in store {
            let mut counts: HashMap<usize, u32> = HashMap::new();
            for phrase in tokenize::phrases(record.combined_text()) {
                count_phrase(&phrase, &index, max_tokens, &mut counts);
            }
            let mut row: Vec<(usize, u32)> = counts.into_iter().collect();
            row.sort_unstable_by_key(|(col, _)| *col);
            rows.push(row);
        }

        // Drop columns with no occurrence and compact the remaining indices
        let mut occurs = vec![false; vocab_terms.len()];
        for row in &rows {
            for &(col, _) in row {
                occurs[col] = true;
            }
        }
        let mut remap = vec![usize::MAX; vocab_terms.len()];
        let mut terms = Vec::new();
        for (old, term) in vocab_terms.iter().enumerate() {
            if occurs[old] {
                remap[old] = terms.len();
                terms.push(term.to_string());
            }
        }

        if terms.is_empty() {
            return Err(KeywordError::empty_vocabulary(
                Stage::DocumentTermMatrix,
                format!(
                    "none of the {} vocabulary terms occurs in any record",
                    vocab_terms.len()
                ),
            ));
        }

        let mut row_offsets = Vec::with_capacity(rows.len() + 1);
        let mut columns = Vec::new();
        let mut values = Vec::new();
        row_offsets.push(0);
        for row in rows {
            for (col, count) in row {
                columns.push(remap[col]);
                values.push(if self.presence_only { 1 } else { count });
            }
            row_offsets.push(columns.len());
        }

        let dtm = DocumentTermMatrix {
            terms,
            row_offsets,
            columns,
            counts: values,
        };

        info!(
            docs = dtm.n_docs(),
            terms = dtm.n_terms(),
            dropped = vocab_terms.len() - dtm.n_terms(),
            nonzero = dtm.nnz(),
            presence_only = self.presence_only,
            "Built document-term matrix"
        );

        Ok(dtm)
    }
}

/// Count non-overlapping matches of every vocabulary term in one phrase.
fn count_phrase(
    phrase: &[String],
    index: &HashMap<&str, usize>,
    max_tokens: usize,
    counts: &mut HashMap<usize, u32>,
) {
    // Position after the last counted match, per term
    let mut resume_at: HashMap<usize, usize> = HashMap::new();
    let mut gram = String::new();

    for start in 0..phrase.len() {
        gram.clear();
        for end in start..phrase.len().min(start + max_tokens) {
            if end > start {
                gram.push(' ');
            }
            gram.push_str(&phrase[end]);

            if let Some(&col) = index.get(gram.as_str()) {
                let free = resume_at.get(&col).map_or(true, |&pos| start >= pos);
                if free {
                    *counts.entry(col).or_insert(0) += 1;
                    resume_at.insert(col, end + 1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::record::Record;

    fn store(texts: &[&str]) -> RecordStore {
        RecordStore::from_records(
            texts
                .iter()
                .map(|t| Record::new("", *t, Vec::<String>::new()))
                .collect(),
        )
    }

    #[test]
    fn test_counts_and_column_order() {
        let s = store(&["kelp kelp silt", "silt peat"]);
        let vocab = Vocabulary::from_terms(["silt", "kelp", "peat"]);
        let dtm = DtmBuilder::new().build(&s, &vocab).unwrap();

        assert_eq!(dtm.terms(), &["kelp", "peat", "silt"]);
        assert_eq!(dtm.n_docs(), 2);
        let kelp = dtm.column_of("kelp").unwrap();
        let silt = dtm.column_of("silt").unwrap();
        let peat = dtm.column_of("peat").unwrap();
        assert_eq!(dtm.get(0, kelp), 2);
        assert_eq!(dtm.get(0, silt), 1);
        assert_eq!(dtm.get(0, peat), 0);
        assert_eq!(dtm.get(1, peat), 1);
        assert_eq!(dtm.nnz(), 4);
    }

    #[test]
    fn test_presence_only_is_binary() {
        let s = store(&["kelp kelp kelp"]);
        let vocab = Vocabulary::from_terms(["kelp"]);
        let dtm = DtmBuilder::new().presence_only(true).build(&s, &vocab).unwrap();
        assert_eq!(dtm.get(0, 0), 1);
    }

    #[test]
    fn test_non_overlapping_scan() {
        // "kelp kelp kelp" contains "kelp kelp" twice if overlaps were allowed
        let s = store(&["kelp kelp kelp"]);
        let vocab = Vocabulary::from_terms(["kelp kelp"]);
        let dtm = DtmBuilder::new().build(&s, &vocab).unwrap();
        assert_eq!(dtm.get(0, 0), 1);
    }

    #[test]
    fn test_token_aligned_matching() {
        // "gis" must not match inside "biologists"
        let s = store(&["biologists study kelp"]);
        let vocab = Vocabulary::from_terms(["gis", "kelp"]);
        let dtm = DtmBuilder::new().build(&s, &vocab).unwrap();
        assert_eq!(dtm.terms(), &["kelp"]);
    }

    #[test]
    fn test_matches_do_not_cross_phrases() {
        let s = store(&["kelp. forest"]);
        let vocab = Vocabulary::from_terms(["kelp forest", "forest"]);
        let dtm = DtmBuilder::new().build(&s, &vocab).unwrap();
        assert_eq!(dtm.terms(), &["forest"]);
    }

    #[test]
    fn test_unused_terms_dropped() {
        let s = store(&["kelp"]);
        let vocab = Vocabulary::from_terms(["kelp", "moss"]);
        let dtm = DtmBuilder::new().build(&s, &vocab).unwrap();
        assert_eq!(dtm.n_terms(), 1);
        assert_eq!(dtm.document_frequencies(), vec![1]);
    }

    #[test]
    fn test_empty_vocabulary_fails() {
        let err = DtmBuilder::new()
            .build(&store(&["kelp"]), &Vocabulary::new())
            .unwrap_err();
        assert_eq!(err.kind(), "EmptyVocabularyError");
    }

    #[test]
    fn test_no_occurring_terms_fails() {
        let err = DtmBuilder::new()
            .build(&store(&["kelp"]), &Vocabulary::from_terms(["moss"]))
            .unwrap_err();
        assert_eq!(err.kind(), "EmptyVocabularyError");
    }
}
