//! Integration tests for `OpenAiClient` using wiremock HTTP mocks.

use jungai_classifier::{ChatRequest, ClassifierError, OpenAiClient, TextGenerator};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OpenAiClient {
    OpenAiClient::with_base_url("test-key", "gpt-test", 30, base_url)
        .expect("client construction should not fail")
}

fn request(json_response: bool) -> ChatRequest {
    ChatRequest {
        system: "Classify the brand.".to_owned(),
        user: "Corpus text".to_owned(),
        json_response,
    }
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

#[tokio::test]
async fn generate_returns_first_choice_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-test",
            "response_format": { "type": "json_object" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(r#"{"archetype":"Sage","justification":"Research."}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let reply = client.generate(&request(true)).await.expect("reply");

    assert_eq!(reply, r#"{"archetype":"Sage","justification":"Research."}"#);
    assert_eq!(client.model(), "gpt-test");
}

#[tokio::test]
async fn server_error_is_model_unavailable_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate(&request(false)).await.unwrap_err();

    match &err {
        ClassifierError::ModelUnavailable { status, reason } => {
            assert_eq!(*status, Some(500));
            assert!(reason.contains("upstream exploded"), "reason: {reason}");
        }
        other => panic!("expected ModelUnavailable, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn rejected_key_is_not_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "Incorrect API key provided" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate(&request(true)).await.unwrap_err();

    assert!(matches!(
        err,
        ClassifierError::ModelUnavailable {
            status: Some(401),
            ..
        }
    ));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn empty_choices_is_model_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate(&request(false)).await.unwrap_err();

    match err {
        ClassifierError::ModelUnavailable { reason, .. } => {
            assert!(reason.contains("no choices"), "reason: {reason}");
        }
        other => panic!("expected ModelUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_envelope_is_model_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate(&request(false)).await.unwrap_err();

    assert!(matches!(err, ClassifierError::ModelUnavailable { .. }));
}

#[tokio::test]
async fn null_content_is_an_empty_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": null } } ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let reply = client.generate(&request(false)).await.expect("reply");

    assert!(reply.is_empty());
}
