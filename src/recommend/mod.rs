//! Refactoring recommendations.
//!
//! Strategy and confidence are pure functions of cluster properties, so
//! both are plain tagged enums; no behavior hangs off them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cluster::DuplicateCluster;
use crate::config::DetectionConfig;

/// How a duplicate cluster should be consolidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every pair is safe and all duplicates share one class scope.
    ExtractMethod,
    /// Every pair is safe but duplicates span multiple classes or files.
    UtilityClass,
    /// Something disqualified automatic consolidation; a human decides.
    ManualReview,
}

/// Coarse bucket summarizing how strongly a cluster's members resemble
/// one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Recommendation attached to a ranked cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecommendation {
    pub strategy: Strategy,
    pub confidence: Confidence,
    /// Deterministic name suggestion for the extracted unit; absent for
    /// manual review.
    pub suggested_name: Option<String>,
}

/// Recommend a consolidation strategy for one cluster. `ordinal` is the
/// cluster's 1-based rank, used by the fallback name.
pub fn recommend(
    cluster: &DuplicateCluster,
    ordinal: usize,
    config: &DetectionConfig,
) -> ClusterRecommendation {
    let all_safe = cluster
        .duplicates
        .iter()
        .all(|pair| pair.result.can_refactor());

    let sequences = cluster.sequences();
    let scopes: BTreeSet<&str> = sequences.iter().map(|s| s.class_scope()).collect();

    // Never auto-recommend an unsafe transform.
    let strategy = if !all_safe {
        Strategy::ManualReview
    } else if scopes.len() <= 1 {
        Strategy::ExtractMethod
    } else {
        Strategy::UtilityClass
    };

    let mean = cluster.mean_overall_score();
    let confidence = if mean >= config.confidence.high {
        Confidence::High
    } else if mean >= config.confidence.medium {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let suggested_name = match strategy {
        Strategy::ManualReview => None,
        _ => {
            let methods: Vec<&str> = {
                let mut seen = BTreeSet::new();
                sequences
                    .iter()
                    .filter_map(|s| s.method.as_deref())
                    .filter(|m| seen.insert(*m))
                    .collect()
            };
            Some(suggest_method_name(&methods, ordinal))
        }
    };

    ClusterRecommendation {
        strategy,
        confidence,
        suggested_name,
    }
}

/// Derive a name from tokens shared by the containing-method names,
/// falling back to a generic numbered name.
fn suggest_method_name(methods: &[&str], ordinal: usize) -> String {
    let token_lists: Vec<Vec<String>> = methods.iter().map(|m| tokenize(m)).collect();
    if let Some((head, rest)) = token_lists.split_first() {
        let mut common: Vec<&str> = Vec::new();
        for token in head {
            if rest.iter().all(|tokens| tokens.iter().any(|t| t == token))
                && !common.contains(&token.as_str())
            {
                common.push(token.as_str());
            }
        }
        if !common.is_empty() {
            return camel_join(&common);
        }
    }
    format!("extractedBlock{ordinal}")
}

/// Split a method name into lowercase tokens at snake_case and camelCase
/// boundaries.
fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for part in name.split(|c: char| c == '_' || c == '.' || c == ':') {
        let mut current = String::new();
        for ch in part.chars() {
            if ch.is_uppercase() && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current.extend(ch.to_lowercase());
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}

fn camel_join(tokens: &[&str]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i == 0 {
            out.push_str(token);
        } else {
            let mut chars = token.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}
