//! Integration tests for Corpus-Sieve
//!
//! These tests use wiremock to stand in for article hosts and the
//! completion endpoint, and temporary directories for the record store.

mod classify_tests;
mod extract_tests;
mod fetch_tests;
mod pipeline_tests;

use corpus_sieve::config::FetchConfig;
use corpus_sieve::fetch::Fetcher;

/// Fetcher with short timeouts and near-instant backoff
pub fn test_fetcher() -> Fetcher {
    Fetcher::new(&test_fetch_config()).expect("Failed to build fetcher")
}

pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout_ms: 1_000,
        retry_base_delay_ms: 10,
        ..FetchConfig::default()
    }
}

/// Wraps `body` in an HTML page
pub fn html_page(body: &str) -> String {
    format!(
        "<html><head><meta charset=\"utf-8\"><title>test</title></head><body>{}</body></html>",
        body
    )
}
