//! Analysis output types consumed by a reporting collaborator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cluster::DuplicateCluster;
use crate::core::Result;
use crate::similarity::SimilarityPair;

/// Duplication findings for one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicationReport {
    /// Source file identifier.
    pub file: String,
    /// Accepted pairs whose earlier sequence lives in this file, ordered.
    pub duplicates: Vec<SimilarityPair>,
    /// Ranked clusters whose primary lives in this file.
    pub clusters: Vec<DuplicateCluster>,
}

impl DuplicationReport {
    /// Create an empty report for a file.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            duplicates: Vec::new(),
            clusters: Vec::new(),
        }
    }

    /// Whether any duplicate pair was found.
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Number of accepted pairs.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }
}

/// A per-file problem recorded without aborting the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub file: String,
    pub message: String,
}

/// Aggregate statistics for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Candidate sequences that entered pairing.
    pub sequences: usize,
    /// Pairs actually compared.
    pub pairs_compared: usize,
    /// Pairs at or above the acceptance threshold.
    pub pairs_accepted: usize,
    /// Clusters formed from accepted pairs.
    pub clusters: usize,
    /// Pairs skipped because the time budget ran out.
    pub truncated_pairs: usize,
    /// Analysis duration.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Full result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Per-file reports, sorted by file.
    pub reports: Vec<DuplicationReport>,
    /// Recorded per-file failures (partial-failure semantics).
    pub failures: Vec<AnalysisFailure>,
    /// Aggregate statistics.
    pub summary: AnalysisSummary,
}

impl Analysis {
    /// Look up the report for a file.
    pub fn report_for(&self, file: &str) -> Option<&DuplicationReport> {
        self.reports.iter().find(|r| r.file == file)
    }

    /// Total accepted pairs across all files.
    pub fn duplicate_count(&self) -> usize {
        self.reports.iter().map(DuplicationReport::duplicate_count).sum()
    }

    /// Serialize for a rendering collaborator.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

mod duration_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
