//! URL handling module for Corpus-Sieve
//!
//! Host extraction for rule-map lookups and query parameter access for
//! thread identity comparisons.

mod domain;

pub use domain::{extract_host, host_of};

use url::Url;

/// Returns the first value of query parameter `name`, if present
///
/// Unparsable URLs have no parameters.
///
/// # Examples
///
/// ```
/// use corpus_sieve::url::query_param;
///
/// let url = "https://kin.naver.com/qna/detail.naver?d1id=7&dirId=70109&docId=4511";
/// assert_eq!(query_param(url, "docId"), Some("4511".to_string()));
/// assert_eq!(query_param(url, "missing"), None);
/// ```
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
