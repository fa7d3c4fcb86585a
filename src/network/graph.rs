// Term co-occurrence network.
//
// Nodes are the columns of the document-term matrix. Two terms are joined
// by an undirected edge when at least one document contains both. The
// adjacency is stored in CSR form, symmetric, with neighbors sorted.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matrix::DocumentTermMatrix;

/// How a shared document contributes to an edge's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// +1 for every document containing both terms
    #[default]
    Presence,
    /// + min(count(t1, d), count(t2, d)) for every document
    Count,
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::Presence => f.write_str("presence"),
            Weighting::Count => f.write_str("count"),
        }
    }
}

impl FromStr for Weighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "presence" => Ok(Weighting::Presence),
            "count" => Ok(Weighting::Count),
            other => Err(format!("unknown weighting '{other}' (expected presence or count)")),
        }
    }
}

/// Undirected weighted co-occurrence graph without self-loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoOccurrenceNetwork {
    terms: Vec<String>,
    /// Offsets into `neighbors`/`weights`. Size = node_count + 1
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
    /// Edge weights aligned with `neighbors`
    weights: Vec<u64>,
    weighting: Weighting,
}

impl CoOccurrenceNetwork {
    /// Build the network from a document-term matrix.
    ///
    /// Weights are integer sums, so the result does not depend on the order
    /// in which documents or pairs are visited.
    pub fn from_dtm(dtm: &DocumentTermMatrix, weighting: Weighting) -> Self {
        let mut pair_weights: HashMap<(usize, usize), u64> = HashMap::new();

        for doc in 0..dtm.n_docs() {
            // Columns ascend within a row, so every pair comes out as (low, high)
            let row: Vec<(usize, u32)> = dtm.row(doc).collect();
            for (i, &(a, count_a)) in row.iter().enumerate() {
                for &(b, count_b) in &row[i + 1..] {
                    let w = match weighting {
                        Weighting::Presence => 1,
                        Weighting::Count => u64::from(count_a.min(count_b)),
                    };
                    *pair_weights.entry((a, b)).or_insert(0) += w;
                }
            }
        }

        let node_count = dtm.n_terms();
        let mut adjacency: Vec<Vec<(usize, u64)>> = vec![Vec::new(); node_count];
        for (&(a, b), &w) in &pair_weights {
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut neighbors = Vec::with_capacity(pair_weights.len() * 2);
        let mut weights = Vec::with_capacity(pair_weights.len() * 2);
        offsets.push(0);
        for mut adj in adjacency {
            adj.sort_unstable_by_key(|(n, _)| *n);
            for (n, w) in adj {
                neighbors.push(n);
                weights.push(w);
            }
            offsets.push(neighbors.len());
        }

        let network = Self {
            terms: dtm.terms().to_vec(),
            offsets,
            neighbors,
            weights,
            weighting,
        };

        info!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            weighting = %weighting,
            "Built co-occurrence network"
        );

        network
    }

    pub fn node_count(&self) -> usize {
        self.terms.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.len() / 2
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn term(&self, node: usize) -> &str {
        &self.terms[node]
    }

    pub fn node_index(&self, term: &str) -> Option<usize> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }

    /// Neighbors of a node, ascending.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.neighbors[self.offsets[node]..self.offsets[node + 1]]
    }

    /// Weights of a node's edges, aligned with `neighbors(node)`.
    pub fn neighbor_weights(&self, node: usize) -> &[u64] {
        &self.weights[self.offsets[node]..self.offsets[node + 1]]
    }

    /// Unweighted degree: number of incident edges.
    pub fn degree(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    /// Sum of incident edge weights.
    pub fn strength(&self, node: usize) -> u64 {
        self.neighbor_weights(node).iter().sum()
    }

    pub fn edge_weight(&self, a: usize, b: usize) -> Option<u64> {
        self.neighbors(a)
            .binary_search(&b)
            .ok()
            .map(|pos| self.neighbor_weights(a)[pos])
    }

    /// Every undirected edge once, as (low, high, weight), in node order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        (0..self.node_count()).flat_map(move |a| {
            self.neighbors(a)
                .iter()
                .zip(self.neighbor_weights(a))
                .filter(move |&(&b, _)| b > a)
                .map(move |(&b, &w)| (a, b, w))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::record::{Record, RecordStore};
    use crate::matrix::DtmBuilder;
    use crate::terms::Vocabulary;

    fn network(texts: &[&str], terms: &[&str], weighting: Weighting) -> CoOccurrenceNetwork {
        let store = RecordStore::from_records(
            texts
                .iter()
                .map(|t| Record::new("", *t, Vec::<String>::new()))
                .collect(),
        );
        let vocab = Vocabulary::from_terms(terms.iter().copied());
        let dtm = DtmBuilder::new().build(&store, &vocab).unwrap();
        CoOccurrenceNetwork::from_dtm(&dtm, weighting)
    }

    #[test]
    fn test_presence_weights_count_documents() {
        let net = network(
            &["kelp silt", "kelp silt kelp", "kelp peat"],
            &["kelp", "silt", "peat"],
            Weighting::Presence,
        );
        let kelp = net.node_index("kelp").unwrap();
        let silt = net.node_index("silt").unwrap();
        let peat = net.node_index("peat").unwrap();

        assert_eq!(net.node_count(), 3);
        assert_eq!(net.edge_count(), 2);
        assert_eq!(net.edge_weight(kelp, silt), Some(2));
        assert_eq!(net.edge_weight(silt, kelp), Some(2));
        assert_eq!(net.edge_weight(kelp, peat), Some(1));
        assert_eq!(net.edge_weight(silt, peat), None);
        assert_eq!(net.strength(kelp), 3);
        assert_eq!(net.degree(kelp), 2);
    }

    #[test]
    fn test_count_weights_use_min_count() {
        let net = network(
            &["kelp kelp kelp silt silt", "kelp silt"],
            &["kelp", "silt"],
            Weighting::Count,
        );
        let kelp = net.node_index("kelp").unwrap();
        let silt = net.node_index("silt").unwrap();
        // min(3, 2) + min(1, 1)
        assert_eq!(net.edge_weight(kelp, silt), Some(3));
    }

    #[test]
    fn test_no_self_loops() {
        let net = network(&["kelp kelp"], &["kelp"], Weighting::Count);
        assert_eq!(net.edge_count(), 0);
        assert_eq!(net.strength(0), 0);
    }

    #[test]
    fn test_edges_listed_once() {
        let net = network(&["kelp silt peat"], &["kelp", "silt", "peat"], Weighting::Presence);
        let edges: Vec<_> = net.edges().collect();
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|&(a, b, w)| a < b && w == 1));
    }

    #[test]
    fn test_deterministic_rebuild() {
        let texts = ["kelp silt moth", "silt moth fern", "fern kelp"];
        let terms = ["kelp", "silt", "moth", "fern"];
        let a = network(&texts, &terms, Weighting::Presence);
        let b = network(&texts, &terms, Weighting::Presence);
        assert_eq!(a, b);
    }
}
