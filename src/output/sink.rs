// Artifact sink: persists pipeline results for download and charting.
//
// The core never writes files. The CLI hands a finished PipelineOutput to a
// sink, which decides where each artifact goes. FileSink writes plain CSV
// and JSON files into one output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::corpus::record::RecordStore;
use crate::keywords::KeywordResult;
use crate::network::graph::CoOccurrenceNetwork;
use crate::pipeline::PipelineOutput;

pub const KEYWORDS_FILE: &str = "relevant_keywords.csv";
pub const DATASET_FILE: &str = "deduplicated_records.json";
pub const EDGES_FILE: &str = "network_edges.csv";
pub const DISTRIBUTION_FILE: &str = "degree_distribution.json";
pub const HISTOGRAM_FILE: &str = "degree_histogram.json";
pub const CURVE_FILE: &str = "cutoff_curve.json";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Destination for pipeline artifacts.
pub trait ArtifactSink {
    /// The final ranked keywords as (term, strength) rows.
    fn write_keywords(&self, keywords: &KeywordResult) -> Result<PathBuf>;

    /// The deduplicated corpus.
    fn write_dataset(&self, store: &RecordStore) -> Result<PathBuf>;

    /// Chart data: edge list, degree distribution, histogram, fitted curve.
    fn write_diagnostics(&self, output: &PipelineOutput) -> Result<Vec<PathBuf>>;

    /// Counts, cutoff and effective configuration of the run.
    fn write_summary(&self, output: &PipelineOutput, config: &PipelineConfig) -> Result<PathBuf>;

    /// Write every artifact. The dataset is only written when requested.
    fn save_all(
        &self,
        output: &PipelineOutput,
        config: &PipelineConfig,
        save_dataset: bool,
    ) -> Result<Vec<PathBuf>> {
        let mut written = vec![self.write_keywords(&output.keywords)?];
        if save_dataset {
            written.push(self.write_dataset(&output.store)?);
        }
        written.extend(self.write_diagnostics(output)?);
        written.push(self.write_summary(output, config)?);
        Ok(written)
    }
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    generated_at: DateTime<Utc>,
    imported: usize,
    records: usize,
    vocabulary: usize,
    nodes: usize,
    edges: usize,
    cutoff: f64,
    cutoff_rank: usize,
    keywords: usize,
    config: &'a PipelineConfig,
}

/// Writes artifacts as files in one directory (created on demand).
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory {}", self.dir.display()))
    }

    fn write_text(&self, name: &str, contents: &str) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(name);
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = contents.len(), "Wrote artifact");
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {name}"))?;
        self.write_text(name, &json)
    }
}

impl ArtifactSink for FileSink {
    fn write_keywords(&self, keywords: &KeywordResult) -> Result<PathBuf> {
        self.write_text(KEYWORDS_FILE, &keywords_csv(keywords))
    }

    fn write_dataset(&self, store: &RecordStore) -> Result<PathBuf> {
        self.write_json(DATASET_FILE, store.records())
    }

    fn write_diagnostics(&self, output: &PipelineOutput) -> Result<Vec<PathBuf>> {
        let mut written = vec![
            self.write_text(EDGES_FILE, &edges_csv(&output.network))?,
            self.write_json(DISTRIBUTION_FILE, &output.distribution)?,
            self.write_json(HISTOGRAM_FILE, &output.histogram)?,
        ];
        if let Some(diagnostics) = &output.cutoff.diagnostics {
            written.push(self.write_json(CURVE_FILE, diagnostics)?);
        }
        Ok(written)
    }

    fn write_summary(&self, output: &PipelineOutput, config: &PipelineConfig) -> Result<PathBuf> {
        let summary = RunSummary {
            generated_at: Utc::now(),
            imported: output.imported,
            records: output.store.len(),
            vocabulary: output.vocabulary.len(),
            nodes: output.network.node_count(),
            edges: output.network.edge_count(),
            cutoff: output.cutoff.cutoff,
            cutoff_rank: output.cutoff.rank,
            keywords: output.keywords.len(),
            config,
        };
        self.write_json(SUMMARY_FILE, &summary)
    }
}

/// Render keywords as a two-column CSV with a header row.
pub fn keywords_csv(keywords: &KeywordResult) -> String {
    let mut out = String::from("term,strength\n");
    for k in keywords.iter() {
        out.push_str(&csv_field(&k.term));
        out.push(',');
        out.push_str(&k.strength.to_string());
        out.push('\n');
    }
    out
}

/// Render the network as an undirected edge list.
pub fn edges_csv(network: &CoOccurrenceNetwork) -> String {
    let mut out = String::from("source,target,weight\n");
    for (a, b, w) in network.edges() {
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(network.term(a)),
            csv_field(network.term(b)),
            w
        ));
    }
    out
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::Keyword;

    #[test]
    fn test_keywords_csv() {
        let result = KeywordResult {
            keywords: vec![
                Keyword {
                    term: "gis".to_string(),
                    strength: 12.0,
                },
                Keyword {
                    term: "soil erosion".to_string(),
                    strength: 3.5,
                },
            ],
        };
        assert_eq!(keywords_csv(&result), "term,strength\ngis,12\nsoil erosion,3.5\n");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
