// Term extraction: candidate keywords from record text and tags.

pub mod phrase;
pub mod tfidf;
pub mod tokenize;
pub mod traits;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::corpus::record::RecordStore;
use crate::error::{KeywordError, LitkeysResult, Stage};

/// Unit in which term length bounds are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Characters of the normalized term, single spaces included
    #[default]
    Characters,
    /// Number of tokens in the term
    Words,
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthUnit::Characters => f.write_str("characters"),
            LengthUnit::Words => f.write_str("words"),
        }
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "characters" | "chars" => Ok(LengthUnit::Characters),
            "words" | "tokens" => Ok(LengthUnit::Words),
            other => Err(format!("unknown length unit '{other}' (expected characters or words)")),
        }
    }
}

/// Inclusive [min, max] bounds on term length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
    pub unit: LengthUnit,
}

impl LengthBounds {
    pub fn new(min: usize, max: usize, unit: LengthUnit) -> Self {
        Self { min, max, unit }
    }

    pub fn validate(&self) -> LitkeysResult<()> {
        if self.min == 0 {
            return Err(KeywordError::configuration(
                Stage::TermExtraction,
                "min_len must be at least 1",
            ));
        }
        if self.min > self.max {
            return Err(KeywordError::configuration(
                Stage::TermExtraction,
                format!("min_len ({}) is greater than max_len ({})", self.min, self.max),
            ));
        }
        Ok(())
    }

    /// Length of a term given as tokens, in this bound's unit.
    pub fn measure<S: AsRef<str>>(&self, tokens: &[S]) -> usize {
        match self.unit {
            LengthUnit::Words => tokens.len(),
            LengthUnit::Characters => {
                let chars: usize = tokens.iter().map(|t| t.as_ref().chars().count()).sum();
                chars + tokens.len().saturating_sub(1)
            }
        }
    }

    pub fn accepts<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        let len = self.measure(tokens);
        len >= self.min && len <= self.max
    }

    /// True once a growing n-gram can no longer come back into bounds.
    pub fn exceeded<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        self.measure(tokens) > self.max
    }
}

/// The deduplicated, sorted set of candidate terms.
///
/// Sorted order is the column order of the document-term matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    terms: BTreeSet<String>,
    /// Terms that came from record tags (subset of `terms`)
    tagged: BTreeSet<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from plain terms (none marked as tags).
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            tagged: BTreeSet::new(),
        }
    }

    pub fn insert(&mut self, term: String) -> bool {
        self.terms.insert(term)
    }

    pub fn insert_tag(&mut self, term: String) -> bool {
        self.tagged.insert(term.clone());
        self.terms.insert(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    /// Terms in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Terms contributed by record tags.
    pub fn tagged_terms(&self) -> &BTreeSet<String> {
        &self.tagged
    }
}

/// Add every in-bounds tag of every record as a term.
///
/// Tags are trusted signal and bypass frequency filters. Tags outside the
/// length bounds are excluded like any other term.
pub(crate) fn add_tag_terms(store: &RecordStore, bounds: &LengthBounds, vocabulary: &mut Vocabulary) {
    for tag in store.all_tags() {
        for term in tokenize::normalize_terms(tag) {
            let tokens: Vec<&str> = term.split(' ').collect();
            if bounds.accepts(&tokens) {
                vocabulary.insert_tag(term);
            }
        }
    }
}
