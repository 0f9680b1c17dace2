//! Article extraction against a mock news host

use crate::{html_page, test_fetcher};
use corpus_sieve::config::{ExtractConfig, DEFAULT_SELECTOR};
use corpus_sieve::extract::{
    AttributeMap, ContentExtractor, Extraction, RedirectRule, RedirectionMap, SelectorRegistry,
};
use corpus_sieve::Record;
use std::collections::BTreeMap;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &str = "의사와 환자가 함께 치료 방법을 결정하는 공유의사결정 사례.";

fn test_extract_config() -> ExtractConfig {
    ExtractConfig {
        min_text_length: 10,
        batch_retry_passes: 2,
        batch_retry_interval_ms: 10,
        batch_retry_cooldown_ms: 10,
        ..ExtractConfig::default()
    }
}

fn extractor(redirects: RedirectionMap) -> ContentExtractor {
    ContentExtractor::new(
        test_fetcher(),
        redirects,
        AttributeMap::new(),
        &test_extract_config(),
    )
}

/// Registry that knows `div.story` only for some other host
fn registry_with_foreign_rule() -> SelectorRegistry {
    let mut rules = BTreeMap::new();
    rules.insert("other.com".to_string(), vec!["div.story".to_string()]);
    SelectorRegistry::new(rules, DEFAULT_SELECTOR)
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page(body))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_rule_is_learned_from_another_host() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/news/1",
        &format!(r#"<div class="story">{}</div>"#, BODY),
    )
    .await;

    let mut registry = registry_with_foreign_rule();
    let extractor = extractor(RedirectionMap::new());

    let url = format!("{}/news/1", mock_server.uri());
    let extraction = extractor.extract_text(&url, &mut registry).await;

    assert_eq!(extraction, Extraction::Text(BODY.to_string()));
    assert_eq!(registry.resolve_selectors("127.0.0.1"), ["div.story"]);
    assert_eq!(registry.learned_count(), 1);
}

#[tokio::test]
async fn test_unreadable_page_is_encoding_error() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/news/2", "<p>광고만 있는 페이지</p>").await;

    let mut registry = registry_with_foreign_rule();
    let extractor = extractor(RedirectionMap::new());

    let url = format!("{}/news/2", mock_server.uri());
    let extraction = extractor.extract_text(&url, &mut registry).await;

    assert_eq!(extraction, Extraction::EncodingError);
    assert!(!registry.is_dirty());
}

#[tokio::test]
async fn test_redirected_url_is_fetched() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/print/77",
        &format!(r#"<div id="article-view-content-div">{}</div>"#, BODY),
    )
    .await;

    let mut redirects = RedirectionMap::new();
    redirects.insert(
        "127.0.0.1",
        RedirectRule::new(
            &[r"idxno=(\d+)"],
            &format!("{}/print/", mock_server.uri()),
            "",
        )
        .unwrap(),
    );

    let mut registry = SelectorRegistry::new(BTreeMap::new(), DEFAULT_SELECTOR);
    let extractor = extractor(redirects);

    let url = format!("{}/news/articleView.html?idxno=77", mock_server.uri());
    let extraction = extractor.extract_text(&url, &mut registry).await;

    assert_eq!(extraction, Extraction::Text(BODY.to_string()));
}

#[tokio::test]
async fn test_collection_with_batch_retries() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/ok",
        &format!(r#"<div class="story">{}</div>"#, BODY),
    )
    .await;
    mount_page(&mock_server, "/unreadable", "<p>짧음</p>").await;

    // Fails once during the first pass, served on the retry pass
    Mock::given(method("GET"))
        .and(path("/recovers"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/recovers",
        &format!(r#"<div class="story">{}</div>"#, BODY),
    )
    .await;

    // Never served
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let base = mock_server.uri();
    let mut records = vec![
        Record::new(format!("{}/ok", base), "ok"),
        Record::new(format!("{}/unreadable", base), "unreadable"),
        Record::new(format!("{}/recovers", base), "recovers"),
        Record::new(format!("{}/down", base), "down"),
    ];

    let mut registry = registry_with_foreign_rule();
    let extractor = extractor(RedirectionMap::new());
    let report = extractor
        .extract_collection(&mut records, &mut registry)
        .await;

    assert_eq!(records[0].text.as_deref(), Some(BODY));
    assert_eq!(records[1].text.as_deref(), Some("encoding_error"));
    assert_eq!(records[2].text.as_deref(), Some(BODY));
    assert_eq!(records[3].text.as_deref(), Some("request_error"));

    assert_eq!(report.total, 4);
    assert_eq!(report.extracted, 2);
    assert_eq!(report.request_errors, vec![format!("{}/down", base)]);
    assert_eq!(report.retry_passes, 2);
    assert_eq!(report.learned_rules, 1);
    assert_eq!(report.failures_by_host["127.0.0.1"].len(), 2);

    // /down: first pass plus two retry passes
    let down_requests = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/down")
        .count();
    assert_eq!(down_requests, 3);
}

#[tokio::test]
async fn test_learned_rules_survive_flush() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/news/1",
        &format!(r#"<div class="story">{}</div>"#, BODY),
    )
    .await;

    let dir = tempdir().unwrap();
    let selectors_path = dir.path().join("selectors.json");
    std::fs::write(&selectors_path, r#"{"other.com": ["div.story"]}"#).unwrap();

    let mut registry = SelectorRegistry::load(&selectors_path, DEFAULT_SELECTOR).unwrap();
    let extractor = extractor(RedirectionMap::new());
    let url = format!("{}/news/1", mock_server.uri());
    extractor.extract_text(&url, &mut registry).await;

    assert!(registry.flush(&selectors_path).unwrap());

    let reloaded = SelectorRegistry::load(&selectors_path, DEFAULT_SELECTOR).unwrap();
    assert_eq!(reloaded.resolve_selectors("127.0.0.1"), ["div.story"]);
    assert_eq!(reloaded.resolve_selectors("other.com"), ["div.story"]);
}
