// Stop-word-delimited n-gram extraction (the default extractor).
//
// Each phrase of a record's combined text is cut into runs at stop words
// and purely numeric tokens, in the spirit of RAKE. Every contiguous
// sub-n-gram of a run whose length lies inside the bounds is a candidate.
// Candidates must appear in at least `min_term_frequency` records; tags
// always pass.

use std::collections::{HashMap, HashSet};

use stop_words::{get, LANGUAGE};
use tracing::info;

use super::tokenize;
use super::traits::TermExtractor;
use super::{add_tag_terms, LengthBounds, Vocabulary};
use crate::corpus::record::{Record, RecordStore};
use crate::error::{KeywordError, LitkeysResult, Stage};

pub struct PhraseExtractor {
    pub bounds: LengthBounds,
    /// Minimum number of records a candidate must appear in (default 1)
    pub min_term_frequency: usize,
    stop_words: HashSet<String>,
}

impl PhraseExtractor {
    /// Extractor using the English stop word list of the `stop-words` crate.
    pub fn new(bounds: LengthBounds) -> Self {
        let stop_words: Vec<String> = get(LANGUAGE::English);
        Self::with_stop_words(bounds, stop_words)
    }

    /// Extractor with a caller-supplied stop word list.
    pub fn with_stop_words<I, S>(bounds: LengthBounds, stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            bounds,
            min_term_frequency: 1,
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn min_term_frequency(mut self, min: usize) -> Self {
        self.min_term_frequency = min;
        self
    }

    fn breaks_run(&self, token: &str) -> bool {
        self.stop_words.contains(token) || tokenize::is_numeric(token)
    }

    /// Distinct in-bounds candidates of one record.
    fn candidates(&self, record: &Record) -> HashSet<String> {
        let mut found = HashSet::new();
        for phrase in tokenize::phrases(record.combined_text()) {
            for run in phrase.split(|t| self.breaks_run(t)) {
                for start in 0..run.len() {
                    for end in start + 1..=run.len() {
                        let gram = &run[start..end];
                        if self.bounds.exceeded(gram) {
                            break;
                        }
                        if self.bounds.accepts(gram) {
                            found.insert(gram.join(" "));
                        }
                    }
                }
            }
        }
        found
    }
}

impl TermExtractor for PhraseExtractor {
    fn extract(&self, store: &RecordStore) -> LitkeysResult<Vocabulary> {
        if store.is_empty() {
            return Err(KeywordError::empty_corpus(
                Stage::TermExtraction,
                "no records to extract terms from",
            ));
        }
        self.bounds.validate()?;
        if self.min_term_frequency == 0 {
            return Err(KeywordError::configuration(
                Stage::TermExtraction,
                "min_term_frequency must be at least 1",
            ));
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for record in store {
            for term in self.candidates(record) {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }
        let candidate_count = document_frequency.len();

        let mut vocabulary = Vocabulary::new();
        for (term, df) in document_frequency {
            if df >= self.min_term_frequency {
                vocabulary.insert(term);
            }
        }
        add_tag_terms(store, &self.bounds, &mut vocabulary);

        info!(
            records = store.len(),
            candidates = candidate_count,
            terms = vocabulary.len(),
            tagged = vocabulary.tagged_terms().len(),
            min_len = self.bounds.min,
            max_len = self.bounds.max,
            unit = %self.bounds.unit,
            "Extracted candidate terms"
        );

        Ok(vocabulary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::LengthUnit;

    fn store(texts: &[&str]) -> RecordStore {
        RecordStore::from_records(
            texts
                .iter()
                .map(|t| Record::new("", *t, Vec::<String>::new()))
                .collect(),
        )
    }

    fn extractor(min: usize, max: usize, unit: LengthUnit) -> PhraseExtractor {
        PhraseExtractor::with_stop_words(LengthBounds::new(min, max, unit), ["the", "of", "with"])
    }

    #[test]
    fn test_runs_break_at_stop_words() {
        let ex = extractor(1, 3, LengthUnit::Words);
        let vocab = ex.extract(&store(&["mapping of soil erosion with lidar"])).unwrap();
        assert!(vocab.contains("soil erosion"));
        assert!(vocab.contains("mapping"));
        assert!(vocab.contains("lidar"));
        assert!(!vocab.contains("mapping of soil"));
        assert!(!vocab.contains("of"));
    }

    #[test]
    fn test_character_bounds() {
        let ex = extractor(2, 4, LengthUnit::Characters);
        let vocab = ex.extract(&store(&["gis kelp mapping"])).unwrap();
        let terms: Vec<&str> = vocab.iter().collect();
        assert_eq!(terms, vec!["gis", "kelp"]);
    }

    #[test]
    fn test_numbers_break_runs() {
        let ex = extractor(1, 3, LengthUnit::Words);
        let vocab = ex.extract(&store(&["kelp 2019 survey"])).unwrap();
        assert!(vocab.contains("kelp"));
        assert!(vocab.contains("survey"));
        assert!(!vocab.contains("2019"));
        assert!(!vocab.contains("kelp 2019"));
    }

    #[test]
    fn test_min_term_frequency_filters_rare_terms() {
        let ex = extractor(1, 2, LengthUnit::Words).min_term_frequency(2);
        let vocab = ex.extract(&store(&["kelp forest", "kelp decline"])).unwrap();
        let terms: Vec<&str> = vocab.iter().collect();
        assert_eq!(terms, vec!["kelp"]);
    }

    #[test]
    fn test_tags_bypass_frequency_but_not_length() {
        let records = RecordStore::from_records(vec![Record::new(
            "",
            "kelp",
            vec!["Sea Urchin Barrens", "GIS"],
        )]);
        let ex = extractor(1, 2, LengthUnit::Words).min_term_frequency(5);
        let vocab = ex.extract(&records).unwrap();
        assert!(vocab.contains("gis"));
        assert!(vocab.tagged_terms().contains("gis"));
        assert!(!vocab.contains("sea urchin barrens"));
        assert!(!vocab.contains("kelp"));
    }

    #[test]
    fn test_empty_store_fails() {
        let ex = extractor(1, 2, LengthUnit::Words);
        let err = ex.extract(&RecordStore::default()).unwrap_err();
        assert_eq!(err.kind(), "EmptyCorpusError");
    }

    #[test]
    fn test_inverted_bounds_fail() {
        let ex = extractor(4, 2, LengthUnit::Characters);
        let err = ex.extract(&store(&["kelp"])).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
