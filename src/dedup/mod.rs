//! Near-duplicate detection
//!
//! A collection is compared pairwise under one [`SimilarityMethod`], the
//! resulting matrix is cached per dataset kind, and a greedy pass drops one
//! record of each pair above the threshold.

mod filter;
mod matrix;
mod similarity;

pub use filter::{filter_duplicates, DedupReport, DropPolicy};
pub use matrix::{collection_fingerprint, compute_similarity, similarity_matrix, SimilarityMatrix};
pub use similarity::{jaccard, url_identity, SimilarityMethod};
