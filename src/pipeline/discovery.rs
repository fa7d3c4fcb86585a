// Keyword discovery pipeline: records -> ranked keywords.
//
// Runs every stage strictly in sequence, each on the fully built output of
// the one before:
// 1. Validate configuration
// 2. Deduplicate records
// 3. Extract the candidate vocabulary
// 4. Build the document-term matrix
// 5. Build the co-occurrence network
// 6. Compute the degree distribution (and histogram)
// 7. Estimate the cutoff
// 8. Select keywords at or above the cutoff
//
// Nothing here touches the filesystem; persistence belongs to the sink.

use serde::Serialize;
use tracing::info;

use crate::config::{ExtractorKind, PipelineConfig};
use crate::corpus::dedup::deduplicate;
use crate::corpus::record::{Record, RecordStore};
use crate::cutoff::CutoffEstimate;
use crate::error::{KeywordError, LitkeysResult, Stage};
use crate::keywords::{select_keywords, KeywordResult};
use crate::matrix::{DocumentTermMatrix, DtmBuilder};
use crate::network::degree::{degree_distribution, histogram, DegreeDistribution, Histogram};
use crate::network::graph::CoOccurrenceNetwork;
use crate::terms::phrase::PhraseExtractor;
use crate::terms::tfidf::TfIdfTermExtractor;
use crate::terms::traits::TermExtractor;
use crate::terms::Vocabulary;

/// Every intermediate value of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Records before deduplication
    pub imported: usize,
    pub store: RecordStore,
    pub vocabulary: Vocabulary,
    pub dtm: DocumentTermMatrix,
    pub network: CoOccurrenceNetwork,
    pub distribution: DegreeDistribution,
    pub histogram: Histogram,
    pub cutoff: CutoffEstimate,
    pub keywords: KeywordResult,
}

/// Build the extractor selected by the configuration.
pub fn extractor_for(config: &PipelineConfig) -> Box<dyn TermExtractor> {
    match config.extractor {
        ExtractorKind::Phrase => Box::new(
            PhraseExtractor::new(config.length_bounds()).min_term_frequency(config.min_term_frequency),
        ),
        ExtractorKind::TfIdf => Box::new(TfIdfTermExtractor::new(
            config.length_bounds(),
            config.tfidf_top_n,
        )),
    }
}

/// Everything up to and including degree analysis. The cutoff has not been
/// estimated yet, so this is available even for networks too small to fit.
#[derive(Debug, Clone, Serialize)]
pub struct DegreeAnalysis {
    /// Records before deduplication
    pub imported: usize,
    pub store: RecordStore,
    pub vocabulary: Vocabulary,
    pub dtm: DocumentTermMatrix,
    pub network: CoOccurrenceNetwork,
    pub distribution: DegreeDistribution,
    pub histogram: Histogram,
}

/// Run the full pipeline.
pub fn run(records: Vec<Record>, config: &PipelineConfig) -> LitkeysResult<PipelineOutput> {
    run_observed(records, config, &mut |_| {})
}

/// Run stages 1 to 6 and stop after degree analysis.
pub fn analyze_degrees(records: Vec<Record>, config: &PipelineConfig) -> LitkeysResult<DegreeAnalysis> {
    analyze_degrees_observed(records, config, &mut |_| {})
}

/// Run stages 1 to 6, calling `on_stage` as each stage starts.
pub fn analyze_degrees_observed(
    records: Vec<Record>,
    config: &PipelineConfig,
    on_stage: &mut dyn FnMut(Stage),
) -> LitkeysResult<DegreeAnalysis> {
    on_stage(Stage::Configuration);
    config.validate()?;

    on_stage(Stage::Deduplication);
    let imported = records.len();
    let store = deduplicate(records, &config.dedup_columns);
    info!(
        imported,
        kept = store.len(),
        removed = imported - store.len(),
        "Deduplicated corpus"
    );
    if store.is_empty() {
        return Err(KeywordError::empty_corpus(
            Stage::Deduplication,
            format!("{imported} records imported, none left after deduplication"),
        ));
    }

    on_stage(Stage::TermExtraction);
    let vocabulary = extractor_for(config).extract(&store)?;

    on_stage(Stage::DocumentTermMatrix);
    let dtm = DtmBuilder::new().build(&store, &vocabulary)?;

    on_stage(Stage::Network);
    let network = CoOccurrenceNetwork::from_dtm(&dtm, config.weighting);

    on_stage(Stage::DegreeAnalysis);
    let distribution = degree_distribution(&network, config.strength_metric);
    let histogram = histogram(&distribution, config.histogram_bins)?;

    Ok(DegreeAnalysis {
        imported,
        store,
        vocabulary,
        dtm,
        network,
        distribution,
        histogram,
    })
}

/// Run the full pipeline, calling `on_stage` as each stage starts.
pub fn run_observed(
    records: Vec<Record>,
    config: &PipelineConfig,
    on_stage: &mut dyn FnMut(Stage),
) -> LitkeysResult<PipelineOutput> {
    let DegreeAnalysis {
        imported,
        store,
        vocabulary,
        dtm,
        network,
        distribution,
        histogram,
    } = analyze_degrees_observed(records, config, on_stage)?;

    on_stage(Stage::CutoffEstimation);
    let cutoff = config
        .cutoff_estimator()
        .estimate(&distribution, config.diagnostics)?;

    on_stage(Stage::KeywordSelection);
    let keywords = select_keywords(&network, config.strength_metric, cutoff.cutoff);

    info!(
        records = store.len(),
        terms = network.node_count(),
        edges = network.edge_count(),
        cutoff = cutoff.cutoff,
        keywords = keywords.len(),
        "Keyword discovery complete"
    );

    Ok(PipelineOutput {
        imported,
        store,
        vocabulary,
        dtm,
        network,
        distribution,
        histogram,
        cutoff,
        keywords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_reported_in_order() {
        let records = vec![
            Record::new("", "kelp silt peat", Vec::<String>::new()),
            Record::new("", "kelp moth fern", Vec::<String>::new()),
        ];
        let mut seen = Vec::new();
        run_observed(records, &PipelineConfig::default(), &mut |s| seen.push(s)).unwrap();
        assert_eq!(seen, Stage::ALL.to_vec());
    }

    #[test]
    fn test_invalid_config_fails_before_any_stage() {
        let config = PipelineConfig {
            min_len: 9,
            max_len: 3,
            ..Default::default()
        };
        let mut seen = Vec::new();
        let err = run_observed(vec![], &config, &mut |s| seen.push(s)).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
        assert_eq!(seen, vec![Stage::Configuration]);
    }

    #[test]
    fn test_degree_analysis_stops_before_cutoff() {
        let records = vec![
            Record::new("", "kelp silt peat", Vec::<String>::new()),
            Record::new("", "kelp moth fern", Vec::<String>::new()),
        ];
        let mut seen = Vec::new();
        let analysis = analyze_degrees_observed(records, &PipelineConfig::default(), &mut |s| seen.push(s)).unwrap();
        assert_eq!(seen, Stage::ALL[..6].to_vec());
        assert_eq!(seen.last(), Some(&Stage::DegreeAnalysis));
        assert_eq!(analysis.histogram.total(), analysis.distribution.len());
    }

    #[test]
    fn test_empty_corpus_fails_at_deduplication() {
        let err = run(vec![], &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "EmptyCorpusError");
        assert_eq!(err.stage(), Stage::Deduplication);
    }
}
