//! Relevance classification against a mock completion endpoint

use corpus_sieve::classify::{
    ChatMessage, CompletionClient, OpenAiClient, RelevanceClassifier, Verdict,
};
use corpus_sieve::config::ClassifierConfig;
use corpus_sieve::{ClassifyError, Record};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_classifier_config(server: &MockServer) -> ClassifierConfig {
    ClassifierConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        organization: Some("org-test".to_string()),
        backoff_unit_ms: 1,
        initial_backoff_exponent: 1,
        timeout_ms: 2_000,
        ..ClassifierConfig::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_openai_client_request_and_reply() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("openai-organization", "org-test"))
        .and(body_partial_json(json!({ "model": "gpt-3.5-turbo", "temperature": 0.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Y\n이유: 관련")))
        .mount(&mock_server)
        .await;

    let config = test_classifier_config(&mock_server);
    let client = OpenAiClient::new(&config, "test-key".to_string()).unwrap();

    let reply = client
        .complete(&[ChatMessage::system("sys"), ChatMessage::user("제목 : t\n내용 : x")])
        .await
        .unwrap();
    assert_eq!(reply, "Y\n이유: 관련");
}

#[tokio::test]
async fn test_openai_client_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&mock_server)
        .await;

    let config = test_classifier_config(&mock_server);
    let client = OpenAiClient::new(&config, "test-key".to_string()).unwrap();

    match client.complete(&[ChatMessage::user("x")]).await {
        Err(ClassifyError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_client_empty_choices() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&mock_server)
        .await;

    let config = test_classifier_config(&mock_server);
    let client = OpenAiClient::new(&config, "test-key".to_string()).unwrap();

    assert!(matches!(
        client.complete(&[ChatMessage::user("x")]).await,
        Err(ClassifyError::EmptyResponse)
    ));
}

#[tokio::test]
async fn test_classifier_recovers_from_rate_limit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("n\n이유: 무관")))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let config = test_classifier_config(&mock_server);
    let client = OpenAiClient::new(&config, "test-key".to_string()).unwrap();
    let classifier = RelevanceClassifier::new(client, &config);

    let records = vec![Record::new("https://a.com/1", "스포츠 기사").with_text("경기 결과")];
    let judgements = classifier
        .classify_relevance(&records, "공유의사결정", "환자와 의사의 공동 결정")
        .await;

    assert_eq!(judgements.len(), 1);
    assert!(!judgements[0].relevant);
    assert_eq!(judgements[0].verdict, Verdict::Answered);
    assert_eq!(judgements[0].reason, "무관");
    assert_eq!(classifier.progress(), (1, 1));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_prompt_carries_topic_and_record() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Y\n관련")))
        .mount(&mock_server)
        .await;

    let config = test_classifier_config(&mock_server);
    let client = OpenAiClient::new(&config, "test-key".to_string()).unwrap();
    let classifier = RelevanceClassifier::new(client, &config);

    let records = vec![Record::new("https://a.com/1", "연명의료 결정").with_text("본문")];
    let judgements = classifier
        .classify_relevance(&records, "공유의사결정", "설명")
        .await;

    assert!(judgements[0].relevant);
    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("\"공유의사결정\"란, 설명"));
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "제목 : 연명의료 결정\n내용 : 본문");
}
