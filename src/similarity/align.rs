//! Longest-common-subsequence alignment of shape-token sequences.
//!
//! One DP table is computed per pair; its backtrace drives the LCS score,
//! the structural score, and the variation extractor, so alignment is never
//! recomputed downstream.

use crate::core::Statement;

/// One step of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOp {
    /// Positions with equal shape kind.
    Match(usize, usize),
    /// Positions aligned against each other but with differing shape kind,
    /// recovered by zipping equal-length unmatched runs.
    Pair(usize, usize),
    /// A position of the first sequence LCS could not bridge.
    GapA(usize),
    /// A position of the second sequence LCS could not bridge.
    GapB(usize),
}

/// Result of aligning two sequences.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Ops in positional order.
    pub ops: Vec<AlignOp>,
    /// Length of the longest common subsequence.
    pub lcs_len: usize,
}

impl Alignment {
    /// Matched position pairs, in order.
    pub fn matches(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            AlignOp::Match(i, j) => Some((*i, *j)),
            _ => None,
        })
    }

    /// Whether any position could not be aligned at all.
    pub fn has_gaps(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, AlignOp::GapA(_) | AlignOp::GapB(_)))
    }
}

/// Align two statement sequences over their shape-token kinds.
pub fn align(a: &[Statement], b: &[Statement]) -> Alignment {
    let m = a.len();
    let n = b.len();

    // dp[i][j] = LCS length of a[i..] and b[j..].
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            dp[i][j] = if a[i].shape.kind == b[j].shape.kind {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }
    let lcs_len = dp[0][0];

    // Forward backtrace. Ties break on token text so that swapping the
    // inputs mirrors the alignment exactly, keeping every derived score
    // symmetric.
    let mut raw = Vec::with_capacity(m + n);
    let (mut i, mut j) = (0, 0);
    while i < m && j < n {
        if a[i].shape.kind == b[j].shape.kind {
            raw.push(AlignOp::Match(i, j));
            i += 1;
            j += 1;
        } else if dp[i + 1][j] > dp[i][j + 1]
            || (dp[i + 1][j] == dp[i][j + 1] && a[i].shape.kind <= b[j].shape.kind)
        {
            raw.push(AlignOp::GapA(i));
            i += 1;
        } else {
            raw.push(AlignOp::GapB(j));
            j += 1;
        }
    }
    while i < m {
        raw.push(AlignOp::GapA(i));
        i += 1;
    }
    while j < n {
        raw.push(AlignOp::GapB(j));
        j += 1;
    }

    // Zip interleaved unmatched runs of equal length into Pair ops; the
    // leftover stays a gap.
    let mut ops = Vec::with_capacity(raw.len());
    let mut pend_a = Vec::new();
    let mut pend_b = Vec::new();
    for op in raw {
        match op {
            AlignOp::Match(_, _) => {
                flush_runs(&mut ops, &mut pend_a, &mut pend_b);
                ops.push(op);
            }
            AlignOp::GapA(i) => pend_a.push(i),
            AlignOp::GapB(j) => pend_b.push(j),
            AlignOp::Pair(_, _) => unreachable!("backtrace emits no pairs"),
        }
    }
    flush_runs(&mut ops, &mut pend_a, &mut pend_b);

    Alignment { ops, lcs_len }
}

fn flush_runs(ops: &mut Vec<AlignOp>, pend_a: &mut Vec<usize>, pend_b: &mut Vec<usize>) {
    let paired = pend_a.len().min(pend_b.len());
    for k in 0..paired {
        ops.push(AlignOp::Pair(pend_a[k], pend_b[k]));
    }
    for &i in &pend_a[paired..] {
        ops.push(AlignOp::GapA(i));
    }
    for &j in &pend_b[paired..] {
        ops.push(AlignOp::GapB(j));
    }
    pend_a.clear();
    pend_b.clear();
}
