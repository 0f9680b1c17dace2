//! Fetch layer against a mock host

use crate::{html_page, test_fetch_config, test_fetcher};
use corpus_sieve::config::FetchConfig;
use corpus_sieve::fetch::{FetchOutcome, Fetcher};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("본문"))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/article", mock_server.uri());
    let page = test_fetcher()
        .fetch(&url, 0, None)
        .await
        .page()
        .expect("Fetch should succeed");

    assert_eq!(page.status_code, 200);
    assert_eq!(page.final_url, url);
    assert!(page.text().contains("본문"));
}

#[tokio::test]
async fn test_retry_after_server_errors() {
    let mock_server = MockServer::start().await;

    // First two requests fail, then the page is served
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("ok")))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let outcome = test_fetcher().fetch(&url, 3, None).await;

    assert!(!outcome.is_failed());
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let url = format!("{}/down", mock_server.uri());
    match test_fetcher().fetch(&url, 2, None).await {
        FetchOutcome::Failed { error, attempts } => {
            assert_eq!(attempts, 3);
            assert_eq!(error, "HTTP 500");
        }
        FetchOutcome::Fetched(_) => panic!("Expected failure"),
    }

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_zero_retries_means_one_attempt() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let outcome = test_fetcher().fetch(&url, 0, None).await;

    assert!(outcome.is_failed());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_timeout_is_a_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("late"))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&FetchConfig {
        timeout_ms: 100,
        ..test_fetch_config()
    })
    .unwrap();

    let url = format!("{}/slow", mock_server.uri());
    match fetcher.fetch(&url, 1, None).await {
        FetchOutcome::Failed { error, attempts } => {
            assert_eq!(error, "Request timeout");
            assert_eq!(attempts, 2);
        }
        FetchOutcome::Fetched(_) => panic!("Expected timeout"),
    }
}

#[tokio::test]
async fn test_timeouts_then_success_follow_backoff_schedule() {
    let mock_server = MockServer::start().await;

    // Attempts 0 and 1 time out, attempt 2 is served
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("late"))
                .set_delay(Duration::from_millis(800)),
        )
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("on time")))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(&FetchConfig {
        timeout_ms: 200,
        retry_base_delay_ms: 1_000,
        ..test_fetch_config()
    })
    .unwrap();

    let url = format!("{}/slow-then-fast", mock_server.uri());
    let started = Instant::now();
    let page = fetcher
        .fetch(&url, 2, None)
        .await
        .page()
        .expect("Third attempt should succeed");
    let elapsed = started.elapsed();

    assert!(page.text().contains("on time"));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);

    // two 200ms timeouts plus 0.5s and 1s of backoff
    assert!(elapsed >= Duration::from_millis(1_900), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(4), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_unlabelled_gzip_body_is_inflated() {
    let mock_server = MockServer::start().await;

    let html = html_page("압축된 본문");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(html.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    // No Content-Encoding header: the client will not inflate it itself
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/gz", mock_server.uri());
    let page = test_fetcher().fetch(&url, 0, None).await.page().unwrap();

    assert_eq!(page.text(), html);
}

#[tokio::test]
async fn test_declared_legacy_charset() {
    let mock_server = MockServer::start().await;

    let html = "<html><body>환자 권리</body></html>";
    let (encoded, _, _) = encoding_rs::EUC_KR.encode(html);
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(encoded.into_owned())
                .insert_header("content-type", "text/html; charset=EUC-KR"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/euckr", mock_server.uri());
    let page = test_fetcher().fetch(&url, 0, None).await.page().unwrap();

    assert!(page.text().contains("환자 권리"));
}

#[tokio::test]
async fn test_cookie_header_is_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("cookie", "NID_AUT=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("member")))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let url = format!("{}/thread", mock_server.uri());
    let fetcher = test_fetcher();

    assert!(!fetcher.fetch(&url, 0, Some("NID_AUT=abc")).await.is_failed());
    assert!(fetcher.fetch(&url, 0, None).await.is_failed());
}
