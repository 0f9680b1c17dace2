//! Greedy duplicate removal over a similarity matrix

use crate::dataset::{DatasetKind, Record};
use crate::dedup::matrix::SimilarityMatrix;
use std::collections::BTreeSet;

/// Which record of a duplicate pair is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPolicy {
    /// Drop the record with less text; the earlier one on a tie
    ShorterText,
    /// Always drop the later record
    Later,
}

impl DropPolicy {
    pub fn for_kind(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::News => Self::ShorterText,
            DatasetKind::Forum => Self::Later,
        }
    }

    fn pick(&self, records: &[Record], i: usize, j: usize) -> usize {
        match self {
            Self::ShorterText if records[i].text_len() > records[j].text_len() => j,
            Self::ShorterText => i,
            Self::Later => j,
        }
    }
}

/// Result of one deduplication pass
#[derive(Debug, Clone, Default)]
pub struct DedupReport {
    pub before: usize,
    pub after: usize,

    /// URLs of the removed records, in original order
    pub removed: Vec<String>,
}

/// Removes near-duplicates from `records` in place
///
/// Rows are scanned in order. For each `i`, the first `j > i` whose
/// similarity exceeds `threshold` marks one record of the pair and ends the
/// scan of that row. Marked records are removed after the scan, highest
/// index first.
pub fn filter_duplicates(
    records: &mut Vec<Record>,
    matrix: &SimilarityMatrix,
    threshold: f64,
    policy: DropPolicy,
) -> DedupReport {
    let n = records.len();
    let before = n;
    let mut marked = BTreeSet::new();

    if matrix.size() != n {
        tracing::warn!(
            matrix = matrix.size(),
            records = n,
            "Similarity matrix does not match the collection, skipping"
        );
        return DedupReport {
            before,
            after: n,
            removed: Vec::new(),
        };
    }

    for i in 0..n {
        if let Some(j) = ((i + 1)..n).find(|&j| matrix.get(i, j) > threshold) {
            marked.insert(policy.pick(records, i, j));
        }
    }

    let removed = marked.iter().map(|&d| records[d].url.clone()).collect();
    for &d in marked.iter().rev() {
        records.remove(d);
    }

    tracing::info!(before, after = records.len(), "Removed duplicates");
    DedupReport {
        before,
        after: records.len(),
        removed,
    }
}
