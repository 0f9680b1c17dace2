//! Pairwise similarity functions

use crate::dataset::Record;
use crate::url::query_param;
use clap::ValueEnum;
use std::collections::HashSet;
use std::fmt;

/// How two records are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum SimilarityMethod {
    /// Overlap of the records' token sets
    Jaccard,
    /// Same forum thread, by `dirId` and `docId` query parameters
    #[value(name = "url")]
    UrlIdentity,
}

impl SimilarityMethod {
    /// Name used in cache keys
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jaccard => "jaccard",
            Self::UrlIdentity => "url",
        }
    }

    /// Similarity of two records under this method
    pub fn similarity(&self, a: &Record, b: &Record) -> f64 {
        match self {
            Self::Jaccard => jaccard(token_slice(a), token_slice(b)),
            Self::UrlIdentity => url_identity(&a.url, &b.url),
        }
    }
}

impl fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn token_slice(record: &Record) -> &[String] {
    record.tokens.as_deref().unwrap_or(&[])
}

/// Jaccard similarity of two token lists, taken as sets
///
/// Two empty lists have similarity 0.
pub fn jaccard<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let a: HashSet<&str> = a.iter().map(AsRef::as_ref).collect();
    let b: HashSet<&str> = b.iter().map(AsRef::as_ref).collect();

    let intersection = a.intersection(&b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// 1.0 when both URLs carry the same `dirId` and `docId`, else 0.0
///
/// A URL missing either parameter matches nothing.
pub fn url_identity(a: &str, b: &str) -> f64 {
    let thread_id = |url: &str| Some((query_param(url, "dirId")?, query_param(url, "docId")?));

    match (thread_id(a), thread_id(b)) {
        (Some(x), Some(y)) if x == y => 1.0,
        _ => 0.0,
    }
}
