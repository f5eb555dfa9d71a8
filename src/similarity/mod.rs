//! Similarity engine.
//!
//! # Overview
//!
//! `compare` scores two statement sequences with three complementary
//! metrics over the shared shape-token abstraction:
//!
//! - **LCS score**: longest common subsequence length over coarse shape
//!   kinds, normalized by the longer sequence.
//! - **Levenshtein score**: `1 − editDistance / max(len)` over the same
//!   token alphabet.
//! - **Structural score**: fraction of LCS-matched positions whose
//!   fine-grained structure signatures (including nested block shape) are
//!   identical; a same-looking linear pattern hiding different internal
//!   structure scores lower here.
//!
//! The overall score is a weighted mean of the three (equal weights by
//! default, configurable). Comparison is a pure function of its inputs and
//! side-effect free, so pairs can be scored in parallel.

pub mod align;
mod levenshtein;

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::core::StatementSequence;
use crate::variation::type_compat::{self, TypeCompatibility, TypeHints};
use crate::variation::{self, VariationAnalysis};

pub use align::{align, AlignOp, Alignment};
pub use levenshtein::token_distance;

/// Similarity verdict for one pair of sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// LCS length / max(len), in [0, 1].
    pub lcs_score: f64,
    /// 1 − edit distance / max(len), in [0, 1].
    pub levenshtein_score: f64,
    /// Share of matched positions with identical fine-grained structure.
    pub structural_score: f64,
    /// Weighted mean of the three component scores.
    pub overall_score: f64,
    /// Statement count of the first sequence.
    pub len_a: usize,
    /// Statement count of the second sequence.
    pub len_b: usize,
    /// Positional differences between the aligned sequences.
    pub variations: VariationAnalysis,
    /// Whether the discovered variations unify to safe parameter types.
    pub type_compatibility: TypeCompatibility,
    /// True when aligned positions differ in control-flow construct kind.
    /// A hard disqualifier for safe extraction regardless of score.
    pub has_control_flow_differences: bool,
}

impl SimilarityResult {
    /// Whether consolidating the pair behind one parameterized unit is
    /// considered safe.
    pub fn can_refactor(&self) -> bool {
        self.type_compatibility.all_type_safe && !self.has_control_flow_differences
    }
}

/// Two sequences plus their similarity verdict. The earlier-starting
/// sequence is conventionally `first`; the order matters only for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub first: StatementSequence,
    pub second: StatementSequence,
    pub result: SimilarityResult,
}

impl SimilarityPair {
    /// Build a pair, putting the earlier-starting sequence first.
    pub fn new(a: StatementSequence, b: StatementSequence, result: SimilarityResult) -> Self {
        let a_key = (a.range.start_line, a.file.clone(), a.range.start_col);
        let b_key = (b.range.start_line, b.file.clone(), b.range.start_col);
        if b_key < a_key {
            Self {
                first: b,
                second: a,
                result,
            }
        } else {
            Self {
                first: a,
                second: b,
                result,
            }
        }
    }
}

/// Compare two sequences. Pure; no side effects.
pub fn compare(
    a: &StatementSequence,
    b: &StatementSequence,
    config: &DetectionConfig,
    hints: &TypeHints,
) -> SimilarityResult {
    let len_a = a.len();
    let len_b = b.len();
    let max_len = len_a.max(len_b);

    if max_len == 0 {
        // Two empty windows are trivially identical.
        return SimilarityResult {
            lcs_score: 1.0,
            levenshtein_score: 1.0,
            structural_score: 1.0,
            overall_score: 1.0,
            len_a,
            len_b,
            variations: VariationAnalysis::default(),
            type_compatibility: type_compat::analyze(&VariationAnalysis::default(), hints),
            has_control_flow_differences: false,
        };
    }

    let alignment = align(&a.statements, &b.statements);

    let lcs_score = alignment.lcs_len as f64 / max_len as f64;
    let distance = token_distance(&a.statements, &b.statements);
    let levenshtein_score = 1.0 - distance as f64 / max_len as f64;

    let matched = alignment.matches().count();
    let structural_score = if matched == 0 {
        0.0
    } else {
        let identical = alignment
            .matches()
            .filter(|&(i, j)| a.statements[i].shape.structure == b.statements[j].shape.structure)
            .count();
        identical as f64 / matched as f64
    };

    let has_control_flow_differences = alignment.ops.iter().any(|op| match op {
        AlignOp::Pair(i, j) => {
            let ca = a.statements[*i].shape.control_flow;
            let cb = b.statements[*j].shape.control_flow;
            (ca.is_some() || cb.is_some()) && ca != cb
        }
        _ => false,
    });

    let variations = variation::extract(a, b, &alignment);
    let type_compatibility = type_compat::analyze(&variations, hints);

    let w = &config.weights;
    let overall_score =
        w.lcs * lcs_score + w.levenshtein * levenshtein_score + w.structural * structural_score;

    SimilarityResult {
        lcs_score,
        levenshtein_score,
        structural_score,
        overall_score,
        len_a,
        len_b,
        variations,
        type_compatibility,
        has_control_flow_differences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ControlFlowKind, ShapeToken, SourceRange, Statement};
    use crate::variation::VariationKind;

    fn seq(file: &str, start: u32, kinds: &[&str]) -> StatementSequence {
        let statements = kinds
            .iter()
            .map(|k| {
                let mut shape = ShapeToken::new(*k, *k);
                shape.control_flow = match *k {
                    "if" => Some(ControlFlowKind::If),
                    "while" => Some(ControlFlowKind::While),
                    "for" => Some(ControlFlowKind::For),
                    _ => None,
                };
                Statement::new(shape, format!("{k};"))
            })
            .collect();
        let end = start + kinds.len() as u32 - 1;
        StatementSequence::new(file, SourceRange::new(start, 1, end, 80), statements)
    }

    fn defaults() -> (DetectionConfig, TypeHints) {
        (DetectionConfig::default(), TypeHints::default())
    }

    #[test]
    fn test_identical_sequences_score_one() {
        let (config, hints) = defaults();
        let a = seq("a.src", 10, &["assign", "if", "call:save/2", "return"]);
        let b = seq("a.src", 50, &["assign", "if", "call:save/2", "return"]);
        let result = compare(&a, &b, &config, &hints);
        assert!((result.lcs_score - 1.0).abs() < f64::EPSILON);
        assert!((result.levenshtein_score - 1.0).abs() < f64::EPSILON);
        assert!((result.structural_score - 1.0).abs() < f64::EPSILON);
        assert!((result.overall_score - 1.0).abs() < 1e-9);
        assert!(result.variations.variations.is_empty());
        assert!(result.can_refactor());
    }

    #[test]
    fn test_component_scores() {
        let (config, hints) = defaults();
        // 3 of 4 tokens align; one substitution.
        let a = seq("a.src", 10, &["assign", "assign", "call:save/2", "return"]);
        let b = seq("a.src", 50, &["assign", "call:load/1", "call:save/2", "return"]);
        let result = compare(&a, &b, &config, &hints);
        assert!((result.lcs_score - 0.75).abs() < f64::EPSILON);
        assert!((result.levenshtein_score - 0.75).abs() < f64::EPSILON);
        assert!((result.structural_score - 1.0).abs() < f64::EPSILON);
        let expected = (0.75 + 0.75 + 1.0) / 3.0;
        assert!((result.overall_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_control_flow_difference_detected() {
        let (config, hints) = defaults();
        let a = seq("a.src", 10, &["assign", "if", "return"]);
        let b = seq("a.src", 50, &["assign", "while", "return"]);
        let result = compare(&a, &b, &config, &hints);
        assert!(result.has_control_flow_differences);
        assert!(!result.can_refactor());
        assert!(result
            .variations
            .variations
            .iter()
            .any(|v| v.kind == VariationKind::ControlFlow));
    }

    #[test]
    fn test_structural_score_penalizes_internal_shape() {
        let (config, hints) = defaults();
        let mut a = seq("a.src", 10, &["if", "return"]);
        let mut b = seq("a.src", 50, &["if", "return"]);
        // Same coarse kind, different nested block shape.
        a.statements[0].shape.structure = "if(cond){assign;call}".to_string();
        b.statements[0].shape.structure = "if(cond){return}".to_string();
        let result = compare(&a, &b, &config, &hints);
        assert!((result.lcs_score - 1.0).abs() < f64::EPSILON);
        assert!((result.structural_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_symmetry() {
        let (config, hints) = defaults();
        let a = seq("a.src", 10, &["assign", "if", "call:save/2", "return"]);
        let b = seq("b.src", 20, &["assign", "while", "call:log/1", "return"]);
        let ab = compare(&a, &b, &config, &hints);
        let ba = compare(&b, &a, &config, &hints);
        assert_eq!(ab.lcs_score, ba.lcs_score);
        assert_eq!(ab.levenshtein_score, ba.levenshtein_score);
        assert_eq!(ab.structural_score, ba.structural_score);
        assert_eq!(ab.overall_score, ba.overall_score);
    }

    #[test]
    fn test_pair_orders_by_start_line() {
        let (config, hints) = defaults();
        let early = seq("a.src", 10, &["assign", "return"]);
        let late = seq("a.src", 50, &["assign", "return"]);
        let result = compare(&late, &early, &config, &hints);
        let pair = SimilarityPair::new(late.clone(), early.clone(), result);
        assert_eq!(pair.first.range.start_line, 10);
        assert_eq!(pair.second.range.start_line, 50);
    }

    #[test]
    fn test_custom_weights() {
        let (mut config, hints) = defaults();
        config.weights.lcs = 1.0;
        config.weights.levenshtein = 0.0;
        config.weights.structural = 0.0;
        let a = seq("a.src", 10, &["assign", "assign", "call:save/2", "return"]);
        let b = seq("a.src", 50, &["assign", "call:load/1", "call:save/2", "return"]);
        let result = compare(&a, &b, &config, &hints);
        assert!((result.overall_score - result.lcs_score).abs() < f64::EPSILON);
    }
}
