//! Analysis engine.
//!
//! # Overview
//!
//! `Detector` drives the full pipeline: scope-filtered candidate pairing,
//! parallel similarity comparison, clustering of accepted pairs, and
//! per-file report assembly.
//!
//! Comparison is embarrassingly parallel — each pair is a pure function of
//! its two sequences — so pairs are scored on the rayon pool with a
//! thread-safe append-only collector. Clustering needs global visibility
//! of every accepted pair, so it runs single-threaded after the parallel
//! barrier; union-find construction is cheap enough not to need more.
//!
//! # Example
//!
//! ```
//! use doppel::config::DetectionConfig;
//! use doppel::core::{ShapeToken, SourceRange, Statement, StatementSequence};
//! use doppel::Detector;
//!
//! let window = |start: u32| {
//!     let statements = vec![
//!         Statement::new(ShapeToken::new("assign", "assign:int"), "total = 0;"),
//!         Statement::new(ShapeToken::new("call:save/1", "call:save/1"), "save(id);"),
//!     ];
//!     StatementSequence::new("billing.src", SourceRange::new(start, 1, start + 1, 40), statements)
//! };
//!
//! let config = DetectionConfig {
//!     min_lines: 2,
//!     ..DetectionConfig::default()
//! };
//! let detector = Detector::new(config).unwrap();
//! let analysis = detector.analyze(&[window(10), window(50)]).unwrap();
//! assert!(analysis.reports[0].has_duplicates());
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::cluster;
use crate::config::{DetectionConfig, Scope};
use crate::core::{Result, StatementSequence};
use crate::recommend;
use crate::report::{Analysis, AnalysisFailure, AnalysisSummary, DuplicationReport};
use crate::similarity::{self, SimilarityPair};
use crate::variation::type_compat::TypeHints;

type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Duplicate detector for one immutable configuration.
pub struct Detector {
    config: DetectionConfig,
    hints: TypeHints,
    on_progress: Option<ProgressFn>,
}

impl Detector {
    /// Create a detector. The configuration is validated eagerly; this is
    /// the only fatal error in the core.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            hints: TypeHints::default(),
            on_progress: None,
        })
    }

    /// Supply declared-type hints for identifier/type unification.
    pub fn with_type_hints(mut self, hints: TypeHints) -> Self {
        self.hints = hints;
        self
    }

    /// Add a progress callback, called once per compared pair.
    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// The detector's configuration.
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run the full pipeline over the supplied candidate sequences.
    ///
    /// Re-running on unchanged input produces identical cluster
    /// membership, ordering, and recommendations; input order does not
    /// matter.
    pub fn analyze(&self, sequences: &[StatementSequence]) -> Result<Analysis> {
        let start = Instant::now();

        let mut failures = Vec::new();
        let mut candidates: Vec<&StatementSequence> = Vec::new();
        for seq in sequences {
            match seq.check_well_formed() {
                Ok(()) if seq.len() < self.config.min_lines => {
                    tracing::debug!(
                        file = %seq.file,
                        len = seq.len(),
                        min_lines = self.config.min_lines,
                        "sequence below minimum length, skipped"
                    );
                }
                Ok(()) => candidates.push(seq),
                Err(reason) => {
                    tracing::warn!(file = %seq.file, %reason, "malformed candidate sequence skipped");
                    failures.push(AnalysisFailure {
                        file: seq.file.clone(),
                        message: reason,
                    });
                }
            }
        }

        let scope = self.config.effective_scope();
        let mut pair_indices = Vec::new();
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                if comparable(candidates[i], candidates[j], scope) {
                    pair_indices.push((i, j));
                }
            }
        }
        let total = pair_indices.len();

        let budget = self.config.time_budget_ms.map(Duration::from_millis);
        let accepted: Mutex<Vec<SimilarityPair>> = Mutex::new(Vec::new());
        let compared = AtomicUsize::new(0);
        let truncated = AtomicUsize::new(0);

        pair_indices.par_iter().for_each(|&(i, j)| {
            if let Some(budget) = budget {
                if start.elapsed() >= budget {
                    truncated.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            }

            let a = candidates[i];
            let b = candidates[j];
            let result = similarity::compare(a, b, &self.config, &self.hints);

            let done = compared.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref f) = self.on_progress {
                f(done, total);
            }

            // Threshold is inclusive.
            if result.overall_score >= self.config.threshold {
                let pair = SimilarityPair::new(a.clone(), b.clone(), result);
                accepted.lock().push(pair);
            }
        });

        let mut accepted = accepted.into_inner();
        // The parallel collector's order is nondeterministic; re-establish
        // a canonical order before clustering.
        accepted.sort_by(|x, y| {
            (x.first.key(), x.second.key()).cmp(&(y.first.key(), y.second.key()))
        });

        let truncated = truncated.load(Ordering::Relaxed);
        if truncated > 0 {
            tracing::warn!(
                truncated,
                total,
                "time budget exhausted; proceeding with accepted pairs"
            );
        }

        let mut clusters = cluster::cluster(&accepted);
        for (rank, c) in clusters.iter_mut().enumerate() {
            let recommendation = recommend::recommend(c, rank + 1, &self.config);
            c.recommendation = Some(recommendation);
        }

        let summary = AnalysisSummary {
            sequences: candidates.len(),
            pairs_compared: compared.load(Ordering::Relaxed),
            pairs_accepted: accepted.len(),
            clusters: clusters.len(),
            truncated_pairs: truncated,
            duration: start.elapsed(),
        };

        let mut by_file: BTreeMap<String, DuplicationReport> = BTreeMap::new();
        for pair in &accepted {
            by_file
                .entry(pair.first.file.clone())
                .or_insert_with(|| DuplicationReport::new(pair.first.file.clone()))
                .duplicates
                .push(pair.clone());
        }
        for c in clusters {
            by_file
                .entry(c.primary.file.clone())
                .or_insert_with(|| DuplicationReport::new(c.primary.file.clone()))
                .clusters
                .push(c);
        }
        let reports: Vec<DuplicationReport> = by_file.into_values().collect();

        tracing::info!(
            "duplicate analysis completed in {:?}: {} sequences, {} pairs compared, {} accepted, {} clusters",
            summary.duration,
            summary.sequences,
            summary.pairs_compared,
            summary.pairs_accepted,
            summary.clusters
        );

        Ok(Analysis {
            reports,
            failures,
            summary,
        })
    }
}

/// Whether a pair of candidates is in scope for comparison. Overlapping
/// windows of the same file are never compared; sliding windows from one
/// method trivially overlap themselves.
fn comparable(a: &StatementSequence, b: &StatementSequence, scope: Scope) -> bool {
    if a.key() == b.key() || a.overlaps(b) {
        return false;
    }
    match scope {
        Scope::Method => a.file == b.file && a.method.is_some() && a.method == b.method,
        Scope::File => a.file == b.file,
        Scope::Project => true,
    }
}
