//! Edit distance over shape-token kinds.

use crate::core::Statement;

/// Minimum number of insertions, deletions, and substitutions (unit cost
/// each) transforming one shape-token sequence into the other.
pub fn token_distance(a: &[Statement], b: &[Statement]) -> usize {
    let m = a.len();
    let n = b.len();
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];
    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1].shape.kind != b[j - 1].shape.kind);
            curr[j] = (prev[j - 1] + cost)
                .min(prev[j] + 1)
                .min(curr[j - 1] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}
