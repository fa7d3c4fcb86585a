// Error taxonomy for the keyword pipeline.
//
// Every stage validates its own preconditions and fails with one of these
// kinds. The CLI converts them into anyhow errors at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage that raised an error (or is currently running).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Configuration,
    Deduplication,
    TermExtraction,
    DocumentTermMatrix,
    Network,
    DegreeAnalysis,
    CutoffEstimation,
    KeywordSelection,
}

impl Stage {
    /// All stages in execution order (configuration check first).
    pub const ALL: [Stage; 8] = [
        Stage::Configuration,
        Stage::Deduplication,
        Stage::TermExtraction,
        Stage::DocumentTermMatrix,
        Stage::Network,
        Stage::DegreeAnalysis,
        Stage::CutoffEstimation,
        Stage::KeywordSelection,
    ];

    /// One-based position in execution order.
    pub fn position(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Deduplication => "deduplication",
            Stage::TermExtraction => "term extraction",
            Stage::DocumentTermMatrix => "document-term matrix",
            Stage::Network => "co-occurrence network",
            Stage::DegreeAnalysis => "degree analysis",
            Stage::CutoffEstimation => "cutoff estimation",
            Stage::KeywordSelection => "keyword selection",
        };
        f.write_str(name)
    }
}

/// Errors raised by the analytical core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeywordError {
    /// No records to work with (after import or deduplication)
    #[error("{stage} failed: empty corpus: {reason}")]
    EmptyCorpus { stage: Stage, reason: String },

    /// No terms survived extraction / length filtering
    #[error("{stage} failed: empty vocabulary: {reason}")]
    EmptyVocabulary { stage: Stage, reason: String },

    /// Too few points for the requested spline complexity
    #[error("{stage} failed: insufficient data: {reason}")]
    InsufficientData { stage: Stage, reason: String },

    /// Invalid parameter or parameter combination
    #[error("{stage} failed: invalid configuration: {reason}")]
    Configuration { stage: Stage, reason: String },
}

impl KeywordError {
    pub fn empty_corpus(stage: Stage, reason: impl Into<String>) -> Self {
        Self::EmptyCorpus {
            stage,
            reason: reason.into(),
        }
    }

    pub fn empty_vocabulary(stage: Stage, reason: impl Into<String>) -> Self {
        Self::EmptyVocabulary {
            stage,
            reason: reason.into(),
        }
    }

    pub fn insufficient_data(stage: Stage, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            stage,
            reason: reason.into(),
        }
    }

    pub fn configuration(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Configuration {
            stage,
            reason: reason.into(),
        }
    }

    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::EmptyCorpus { stage, .. }
            | Self::EmptyVocabulary { stage, .. }
            | Self::InsufficientData { stage, .. }
            | Self::Configuration { stage, .. } => *stage,
        }
    }

    /// Taxonomy name of the error kind, as surfaced to users.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCorpus { .. } => "EmptyCorpusError",
            Self::EmptyVocabulary { .. } => "EmptyVocabularyError",
            Self::InsufficientData { .. } => "InsufficientDataError",
            Self::Configuration { .. } => "ConfigurationError",
        }
    }
}

pub type LitkeysResult<T> = Result<T, KeywordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_stage_and_reason() {
        let err = KeywordError::insufficient_data(Stage::CutoffEstimation, "3 points, need 5");
        let msg = err.to_string();
        assert!(msg.contains("cutoff estimation"), "got: {msg}");
        assert!(msg.contains("3 points, need 5"), "got: {msg}");
        assert_eq!(err.kind(), "InsufficientDataError");
        assert_eq!(err.stage(), Stage::CutoffEstimation);
    }

    #[test]
    fn test_position_follows_execution_order() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.position(), i + 1);
        }
        assert_eq!(Stage::DegreeAnalysis.position(), 6);
    }
}
