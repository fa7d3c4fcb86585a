// Term extractor trait.
//
// The default implementation generates stop-word-delimited n-grams; the
// TF-IDF implementation ranks single words instead. Later stages only see
// the resulting Vocabulary.

use super::Vocabulary;
use crate::corpus::record::RecordStore;
use crate::error::LitkeysResult;

/// Trait for extracting a candidate vocabulary from a record store.
pub trait TermExtractor {
    /// Scan every record's combined text and tags and return the terms
    /// that fall inside the configured length bounds.
    fn extract(&self, store: &RecordStore) -> LitkeysResult<Vocabulary>;
}
