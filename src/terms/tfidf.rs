// TF-IDF single-word extraction.
//
// Uses the `keyword_extraction` crate with each record's combined text as a
// separate document. Words shared by every record are downweighted, words
// distinctive to some records are boosted. The top `top_n` words that fit
// the length bounds become the vocabulary, together with the record tags.

use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use stop_words::{get, LANGUAGE};
use tracing::{debug, info};

use super::tokenize;
use super::traits::TermExtractor;
use super::{add_tag_terms, LengthBounds, Vocabulary};
use crate::corpus::record::RecordStore;
use crate::error::{KeywordError, LitkeysResult, Stage};

pub struct TfIdfTermExtractor {
    pub bounds: LengthBounds,
    /// How many top-ranked words to keep before length filtering
    pub top_n: usize,
}

impl TfIdfTermExtractor {
    pub fn new(bounds: LengthBounds, top_n: usize) -> Self {
        Self { bounds, top_n }
    }
}

impl TermExtractor for TfIdfTermExtractor {
    fn extract(&self, store: &RecordStore) -> LitkeysResult<Vocabulary> {
        if store.is_empty() {
            return Err(KeywordError::empty_corpus(
                Stage::TermExtraction,
                "no records to extract terms from",
            ));
        }
        self.bounds.validate()?;
        if self.top_n == 0 {
            return Err(KeywordError::configuration(
                Stage::TermExtraction,
                "tfidf_top_n must be at least 1",
            ));
        }

        let stop_words: Vec<String> = get(LANGUAGE::English);
        let documents: Vec<String> = store
            .iter()
            .map(|r| r.combined_text().to_string())
            .collect();

        let params = TfIdfParams::UnprocessedDocuments(&documents, &stop_words, None);
        let tfidf = TfIdf::new(params);
        let ranked: Vec<(String, f32)> = tfidf.get_ranked_word_scores(self.top_n);

        if let Some((word, score)) = ranked.first() {
            debug!(top_word = %word, top_score = score, "TF-IDF ranking");
        }

        let mut vocabulary = Vocabulary::new();
        for (word, _score) in &ranked {
            // The crate's own tokenizer may leave punctuation attached
            for token in tokenize::tokens(word) {
                if tokenize::is_numeric(&token) {
                    continue;
                }
                if self.bounds.accepts(std::slice::from_ref(&token)) {
                    vocabulary.insert(token);
                }
            }
        }
        add_tag_terms(store, &self.bounds, &mut vocabulary);

        info!(
            records = store.len(),
            ranked = ranked.len(),
            terms = vocabulary.len(),
            tagged = vocabulary.tagged_terms().len(),
            "Extracted TF-IDF terms"
        );

        Ok(vocabulary)
    }
}
