//! Duplicate clustering.
//!
//! Accepted pairs form edges between sequences (identified by file plus
//! source range, never by object reference); connected components become
//! clusters. Union-find over dense indices keeps construction O(pairs) and
//! sidesteps cyclic-graph traversal entirely. Output ordering is fully
//! deterministic and independent of input order.

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::core::{SequenceKey, StatementSequence};
use crate::recommend::ClusterRecommendation;
use crate::similarity::SimilarityPair;

/// Statements a caller pays per call site after extraction.
pub const CALL_SITE_OVERHEAD: usize = 1;

/// A connected group of duplicate sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCluster {
    /// The earliest-appearing sequence; canonical representative for
    /// reporting and extraction targeting.
    pub primary: StatementSequence,
    /// Every accepted pair in the component, not only pairs incident to
    /// the primary.
    pub duplicates: Vec<SimilarityPair>,
    /// Number of distinct sequences in the component.
    pub occurrences: usize,
    /// Lines saved by consolidating into one copy, clamped to zero.
    pub estimated_loc_reduction: usize,
    /// Attached by the recommender after ranking.
    pub recommendation: Option<ClusterRecommendation>,
}

impl DuplicateCluster {
    /// Mean overall similarity across the cluster's pairs.
    pub fn mean_overall_score(&self) -> f64 {
        if self.duplicates.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .duplicates
            .iter()
            .map(|p| p.result.overall_score)
            .sum();
        sum / self.duplicates.len() as f64
    }

    /// Distinct sequences of the cluster, keyed for deduplication.
    pub fn sequences(&self) -> Vec<&StatementSequence> {
        let mut seen: HashMap<SequenceKey, &StatementSequence> = HashMap::new();
        for pair in &self.duplicates {
            seen.entry(pair.first.key()).or_insert(&pair.first);
            seen.entry(pair.second.key()).or_insert(&pair.second);
        }
        let mut out: Vec<&StatementSequence> = seen.into_values().collect();
        out.sort_by_key(|s| s.key());
        out
    }
}

/// Group accepted pairs into connected clusters, ranked by estimated LOC
/// reduction (descending), then pair count (descending), then primary
/// start line (ascending).
pub fn cluster(pairs: &[SimilarityPair]) -> Vec<DuplicateCluster> {
    if pairs.is_empty() {
        return Vec::new();
    }

    // Dense index per unique sequence identity.
    fn index_for(
        seq: &StatementSequence,
        index_of: &mut HashMap<SequenceKey, usize>,
        members: &mut Vec<StatementSequence>,
    ) -> usize {
        if let Some(&idx) = index_of.get(&seq.key()) {
            return idx;
        }
        members.push(seq.clone());
        let idx = members.len() - 1;
        index_of.insert(seq.key(), idx);
        idx
    }

    let mut index_of: HashMap<SequenceKey, usize> = HashMap::new();
    let mut members: Vec<StatementSequence> = Vec::new();
    let mut edges = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let a = index_for(&pair.first, &mut index_of, &mut members);
        let b = index_for(&pair.second, &mut index_of, &mut members);
        edges.push((a, b));
    }

    let mut uf: UnionFind<usize> = UnionFind::new(members.len());
    for &(a, b) in &edges {
        uf.union(a, b);
    }

    // Component root → member indices and pair indices.
    let mut component_members: HashMap<usize, Vec<usize>> = HashMap::new();
    for idx in 0..members.len() {
        component_members.entry(uf.find_mut(idx)).or_default().push(idx);
    }
    let mut component_pairs: HashMap<usize, Vec<usize>> = HashMap::new();
    for (pair_idx, &(a, _)) in edges.iter().enumerate() {
        component_pairs.entry(uf.find_mut(a)).or_default().push(pair_idx);
    }

    let mut clusters: Vec<DuplicateCluster> = component_members
        .into_iter()
        .map(|(root, member_indices)| {
            let primary = member_indices
                .iter()
                .map(|&i| &members[i])
                .min_by_key(|s| (s.range.start_line, s.file.clone(), s.range.start_col))
                .expect("component has at least one member")
                .clone();

            let duplicates: Vec<SimilarityPair> = component_pairs
                .get(&root)
                .into_iter()
                .flatten()
                .map(|&i| pairs[i].clone())
                .collect();

            let occurrences = member_indices.len();
            let representative_len = primary.len();
            let gross = occurrences * representative_len;
            let retained = representative_len + occurrences * CALL_SITE_OVERHEAD;
            let estimated_loc_reduction = gross.saturating_sub(retained);

            DuplicateCluster {
                primary,
                duplicates,
                occurrences,
                estimated_loc_reduction,
                recommendation: None,
            }
        })
        .collect();

    clusters.sort_by(|a, b| {
        b.estimated_loc_reduction
            .cmp(&a.estimated_loc_reduction)
            .then_with(|| b.duplicates.len().cmp(&a.duplicates.len()))
            .then_with(|| a.primary.range.start_line.cmp(&b.primary.range.start_line))
            .then_with(|| a.primary.key().cmp(&b.primary.key()))
    });

    clusters
}
