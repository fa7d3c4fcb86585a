// Degree analysis: per-node strength and the sorted degree distribution.
//
// The distribution feeds the cutoff estimator. The histogram is purely
// descriptive output for an external plotting step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::graph::CoOccurrenceNetwork;
use crate::error::{KeywordError, LitkeysResult, Stage};

/// Default number of histogram buckets.
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

/// Which per-node value ranks terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthMetric {
    /// Sum of incident edge weights
    #[default]
    Strength,
    /// Number of incident edges, ignoring weights
    Degree,
}

impl StrengthMetric {
    pub fn value(self, network: &CoOccurrenceNetwork, node: usize) -> f64 {
        match self {
            StrengthMetric::Strength => network.strength(node) as f64,
            StrengthMetric::Degree => network.degree(node) as f64,
        }
    }
}

impl fmt::Display for StrengthMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrengthMetric::Strength => f.write_str("strength"),
            StrengthMetric::Degree => f.write_str("degree"),
        }
    }
}

impl FromStr for StrengthMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strength" => Ok(StrengthMetric::Strength),
            "degree" => Ok(StrengthMetric::Degree),
            other => Err(format!("unknown metric '{other}' (expected strength or degree)")),
        }
    }
}

/// One node's position in the distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreePoint {
    /// 1-based rank, ascending by value
    pub rank: usize,
    pub term: String,
    pub value: f64,
}

/// Nodes sorted ascending by value, ties broken by term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeDistribution {
    pub metric: StrengthMetric,
    points: Vec<DegreePoint>,
}

impl DegreeDistribution {
    /// Build a distribution from raw (term, value) pairs. Sorting and ranks
    /// are applied here, so input order does not matter.
    pub fn from_values<I>(metric: StrengthMetric, values: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut pairs: Vec<(String, f64)> = values.into_iter().collect();
        pairs.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        let points = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (term, value))| DegreePoint {
                rank: i + 1,
                term,
                value,
            })
            .collect();
        Self { metric, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DegreePoint] {
        &self.points
    }

    /// Values in rank order (non-decreasing).
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.points.first().map(|p| p.value)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }
}

/// Compute every node's value and return the sorted distribution.
pub fn degree_distribution(network: &CoOccurrenceNetwork, metric: StrengthMetric) -> DegreeDistribution {
    let dist = DegreeDistribution::from_values(
        metric,
        (0..network.node_count()).map(|n| (network.term(n).to_string(), metric.value(network, n))),
    );

    info!(
        nodes = dist.len(),
        metric = %metric,
        min = dist.min_value().unwrap_or(0.0),
        max = dist.max_value().unwrap_or(0.0),
        "Computed degree distribution"
    );

    dist
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub metric: StrengthMetric,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Bucket the distribution's values into `bins` equal-width buckets.
///
/// Buckets are half-open except the last, which includes the maximum. A
/// constant distribution collapses to a single bucket.
pub fn histogram(dist: &DegreeDistribution, bins: usize) -> LitkeysResult<Histogram> {
    if bins == 0 {
        return Err(KeywordError::configuration(
            Stage::DegreeAnalysis,
            "histogram_bins must be at least 1",
        ));
    }

    let (min, max) = match (dist.min_value(), dist.max_value()) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Ok(Histogram {
                metric: dist.metric,
                bins: Vec::new(),
            })
        }
    };

    if max <= min {
        return Ok(Histogram {
            metric: dist.metric,
            bins: vec![HistogramBin {
                lower: min,
                upper: max,
                count: dist.len(),
            }],
        });
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for value in dist.values() {
        let idx = (((value - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }

    Ok(Histogram {
        metric: dist.metric,
        bins: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(values: &[(&str, f64)]) -> DegreeDistribution {
        DegreeDistribution::from_values(
            StrengthMetric::Strength,
            values.iter().map(|(t, v)| (t.to_string(), *v)),
        )
    }

    #[test]
    fn test_sorted_with_term_tiebreak() {
        let d = dist(&[("silt", 2.0), ("kelp", 5.0), ("fern", 2.0), ("moth", 0.0)]);
        let terms: Vec<&str> = d.points().iter().map(|p| p.term.as_str()).collect();
        assert_eq!(terms, vec!["moth", "fern", "silt", "kelp"]);
        let ranks: Vec<usize> = d.points().iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_histogram_buckets() {
        let d = dist(&[("a", 0.0), ("b", 1.0), ("c", 2.0), ("d", 4.0)]);
        let h = histogram(&d, 2).unwrap();
        assert_eq!(h.bins.len(), 2);
        assert_eq!(h.bins[0].count, 2);
        assert_eq!(h.bins[1].count, 2);
        assert_eq!(h.bins[1].upper, 4.0);
        assert_eq!(h.total(), 4);
    }

    #[test]
    fn test_histogram_constant_distribution() {
        let d = dist(&[("a", 0.0), ("b", 0.0)]);
        let h = histogram(&d, 10).unwrap();
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.bins[0].count, 2);
    }

    #[test]
    fn test_histogram_zero_bins_rejected() {
        let d = dist(&[("a", 1.0)]);
        let err = histogram(&d, 0).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
