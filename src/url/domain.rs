use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the host a rule map is keyed by
///
/// The host is lowercased and a leading `www.` is dropped, so
/// `https://www.Example.com/a` and `https://example.com/b` share rules.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use corpus_sieve::url::extract_host;
///
/// let url = Url::parse("https://www.example.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://News.Example.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("news.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let h = h.to_lowercase();
        match h.strip_prefix("www.") {
            Some(rest) => rest.to_string(),
            None => h,
        }
    })
}

/// Parses `url` and returns its rule-map host
pub fn host_of(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    extract_host(&parsed).ok_or_else(|| UrlError::MissingHost(url.to_string()))
}
