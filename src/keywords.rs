// Keyword selection: every node at or above the cutoff, strongest first.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::network::degree::StrengthMetric;
use crate::network::graph::CoOccurrenceNetwork;

/// A selected keyword and its network value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub strength: f64,
}

/// Keywords sorted by strength descending, ties by term ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub keywords: Vec<Keyword>,
}

impl KeywordResult {
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keyword> {
        self.keywords.iter()
    }

    pub fn terms(&self) -> Vec<&str> {
        self.keywords.iter().map(|k| k.term.as_str()).collect()
    }
}

/// Select every node whose metric value is at least `cutoff`.
///
/// Returns an empty result when the cutoff exceeds every value.
pub fn select_keywords(network: &CoOccurrenceNetwork, metric: StrengthMetric, cutoff: f64) -> KeywordResult {
    let mut keywords: Vec<Keyword> = (0..network.node_count())
        .filter_map(|node| {
            let strength = metric.value(network, node);
            (strength >= cutoff).then(|| Keyword {
                term: network.term(node).to_string(),
                strength,
            })
        })
        .collect();

    keywords.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| a.term.cmp(&b.term))
    });

    info!(
        selected = keywords.len(),
        nodes = network.node_count(),
        cutoff,
        metric = %metric,
        "Selected keywords"
    );

    KeywordResult { keywords }
}
