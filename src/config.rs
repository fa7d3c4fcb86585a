use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::dedup::DedupField;
use crate::cutoff::{CutoffEstimator, CutoffMethod, DEFAULT_KNOT_NUM, DEFAULT_PERCENT, DEFAULT_SPLINE_DEGREES};
use crate::error::{KeywordError, LitkeysResult, Stage};
use crate::network::degree::{StrengthMetric, DEFAULT_HISTOGRAM_BINS};
use crate::network::graph::Weighting;
use crate::terms::{LengthBounds, LengthUnit};

/// Which term extractor builds the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Stop-word-delimited n-grams (default)
    #[default]
    Phrase,
    /// Single words ranked by TF-IDF
    TfIdf,
}

impl std::fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractorKind::Phrase => f.write_str("phrase"),
            ExtractorKind::TfIdf => f.write_str("tfidf"),
        }
    }
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phrase" => Ok(ExtractorKind::Phrase),
            "tfidf" | "tf-idf" => Ok(ExtractorKind::TfIdf),
            other => Err(format!("unknown extractor '{other}' (expected phrase or tfidf)")),
        }
    }
}

/// Every knob the analytical core accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum term length (inclusive)
    pub min_len: usize,
    /// Maximum term length (inclusive)
    pub max_len: usize,
    /// Unit the length bounds are measured in
    pub length_unit: LengthUnit,
    /// Fields forming the deduplication key
    pub dedup_columns: Vec<DedupField>,
    pub extractor: ExtractorKind,
    /// Words kept by the TF-IDF extractor before length filtering
    pub tfidf_top_n: usize,
    /// Records a phrase candidate must appear in (tags are exempt)
    pub min_term_frequency: usize,
    pub weighting: Weighting,
    pub strength_metric: StrengthMetric,
    pub cutoff_method: CutoffMethod,
    pub spline_degrees: usize,
    pub spline_knot_num: usize,
    /// Target cumulative share in (0, 1]
    pub target_percent: f64,
    pub histogram_bins: usize,
    /// Keep the fitted spline curve in the output
    pub diagnostics: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_len: 2,
            max_len: 4,
            length_unit: LengthUnit::Characters,
            dedup_columns: DedupField::defaults(),
            extractor: ExtractorKind::Phrase,
            tfidf_top_n: 500,
            min_term_frequency: 1,
            weighting: Weighting::Presence,
            strength_metric: StrengthMetric::Strength,
            cutoff_method: CutoffMethod::Spline,
            spline_degrees: DEFAULT_SPLINE_DEGREES,
            spline_knot_num: DEFAULT_KNOT_NUM,
            target_percent: DEFAULT_PERCENT,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            diagnostics: true,
        }
    }
}

impl PipelineConfig {
    pub fn length_bounds(&self) -> LengthBounds {
        LengthBounds::new(self.min_len, self.max_len, self.length_unit)
    }

    pub fn cutoff_estimator(&self) -> CutoffEstimator {
        CutoffEstimator {
            method: self.cutoff_method,
            degrees: self.spline_degrees,
            knot_num: self.spline_knot_num,
            percent: self.target_percent,
        }
    }

    /// Check every parameter before any stage runs.
    pub fn validate(&self) -> LitkeysResult<()> {
        let invalid = |reason: String| Err(KeywordError::configuration(Stage::Configuration, reason));

        if self.min_len == 0 {
            return invalid("min_len must be at least 1".to_string());
        }
        if self.min_len > self.max_len {
            return invalid(format!(
                "min_len ({}) is greater than max_len ({})",
                self.min_len, self.max_len
            ));
        }
        if self.dedup_columns.is_empty() {
            return invalid("dedup_columns must name at least one field".to_string());
        }
        if self.spline_degrees < 1 {
            return invalid("spline_degrees must be at least 1".to_string());
        }
        if self.spline_knot_num < 1 {
            return invalid("spline_knot_num must be at least 1".to_string());
        }
        if !(self.target_percent > 0.0 && self.target_percent <= 1.0) {
            return invalid(format!(
                "target_percent must be in (0, 1], got {}",
                self.target_percent
            ));
        }
        if self.histogram_bins == 0 {
            return invalid("histogram_bins must be at least 1".to_string());
        }
        if self.min_term_frequency == 0 {
            return invalid("min_term_frequency must be at least 1".to_string());
        }
        if self.extractor == ExtractorKind::TfIdf && self.tfidf_top_n == 0 {
            return invalid("tfidf_top_n must be at least 1".to_string());
        }
        Ok(())
    }

    /// Override defaults from `LITKEYS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = env_parse("LITKEYS_MIN_LEN")? {
            config.min_len = v;
        }
        if let Some(v) = env_parse("LITKEYS_MAX_LEN")? {
            config.max_len = v;
        }
        if let Some(v) = env_parse("LITKEYS_LENGTH_UNIT")? {
            config.length_unit = v;
        }
        if let Ok(raw) = env::var("LITKEYS_DEDUP_COLUMNS") {
            config.dedup_columns = parse_dedup_columns(&raw)?;
        }
        if let Some(v) = env_parse("LITKEYS_EXTRACTOR")? {
            config.extractor = v;
        }
        if let Some(v) = env_parse("LITKEYS_TFIDF_TOP_N")? {
            config.tfidf_top_n = v;
        }
        if let Some(v) = env_parse("LITKEYS_MIN_TERM_FREQUENCY")? {
            config.min_term_frequency = v;
        }
        if let Some(v) = env_parse("LITKEYS_WEIGHTING")? {
            config.weighting = v;
        }
        if let Some(v) = env_parse("LITKEYS_METRIC")? {
            config.strength_metric = v;
        }
        if let Some(v) = env_parse("LITKEYS_CUTOFF_METHOD")? {
            config.cutoff_method = v;
        }
        if let Some(v) = env_parse("LITKEYS_SPLINE_DEGREES")? {
            config.spline_degrees = v;
        }
        if let Some(v) = env_parse("LITKEYS_SPLINE_KNOTS")? {
            config.spline_knot_num = v;
        }
        if let Some(v) = env_parse("LITKEYS_PERCENT")? {
            config.target_percent = v;
        }
        if let Some(v) = env_parse("LITKEYS_HISTOGRAM_BINS")? {
            config.histogram_bins = v;
        }
        if let Some(v) = env_parse("LITKEYS_DIAGNOSTICS")? {
            config.diagnostics = v;
        }
        Ok(config)
    }
}

/// Parse a comma-separated list of dedup fields ("title,abstract").
pub fn parse_dedup_columns(raw: &str) -> Result<Vec<DedupField>> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<DedupField>().map_err(anyhow::Error::msg))
        .collect()
}

/// Read and parse an optional environment variable.
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {name}: {raw:?}")),
        _ => Ok(None),
    }
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. CLI flags override
/// anything set here.
pub struct Config {
    pub pipeline: PipelineConfig,
    /// Where the artifact sink writes (LITKEYS_OUTPUT_DIR, default ./outputs)
    pub output_dir: PathBuf,
    /// Also write the deduplicated records (LITKEYS_SAVE_DATASET)
    pub save_dataset: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let pipeline = PipelineConfig::from_env()?;
        let output_dir = env::var("LITKEYS_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./outputs"));
        let save_dataset = env_parse("LITKEYS_SAVE_DATASET")?.unwrap_or(false);

        Ok(Self {
            pipeline,
            output_dir,
            save_dataset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_len, 2);
        assert_eq!(config.max_len, 4);
        assert_eq!(config.dedup_columns, vec![DedupField::Title, DedupField::Abstract]);
        assert_eq!(config.weighting, Weighting::Presence);
        assert_eq!(config.strength_metric, StrengthMetric::Strength);
    }

    #[test]
    fn test_validate_rejects_bad_combinations() {
        let cases = [
            PipelineConfig {
                min_len: 5,
                max_len: 2,
                ..Default::default()
            },
            PipelineConfig {
                target_percent: 0.0,
                ..Default::default()
            },
            PipelineConfig {
                target_percent: 1.01,
                ..Default::default()
            },
            PipelineConfig {
                spline_knot_num: 0,
                ..Default::default()
            },
            PipelineConfig {
                dedup_columns: vec![],
                ..Default::default()
            },
        ];
        for config in cases {
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), "ConfigurationError");
            assert_eq!(err.stage(), Stage::Configuration);
        }
    }

    #[test]
    fn test_percent_one_is_valid() {
        let config = PipelineConfig {
            target_percent: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_dedup_columns() {
        let cols = parse_dedup_columns("title, tags").unwrap();
        assert_eq!(cols, vec![DedupField::Title, DedupField::Tags]);
        assert!(parse_dedup_columns("title,doi").is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let json = r#"{"min_len": 1, "max_len": 3, "length_unit": "words", "weighting": "count"}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.length_unit, LengthUnit::Words);
        assert_eq!(config.weighting, Weighting::Count);
        assert_eq!(config.spline_degrees, DEFAULT_SPLINE_DEGREES);
    }
}
