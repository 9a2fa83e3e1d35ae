//! Completions client tests against a wiremock upstream.

use completions::{
    ChatMessage, CompletionBackend, CompletionsClient, CompletionsConfig, CompletionsError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CompletionsClient {
    let config = CompletionsConfig::builder()
        .api_key("test-key")
        .api_url(server.uri())
        .model("test-model")
        .max_tokens(1000)
        .build();
    CompletionsClient::new(config).unwrap()
}

#[tokio::test]
async fn test_reply_text_returned_unchanged() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "model": "test-model",
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 1000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello there!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 3, "total_tokens": 6}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .complete(vec![ChatMessage::user("hi")])
        .await
        .unwrap();

    assert_eq!(reply, "Hello there!");
}

#[tokio::test]
async fn test_api_error_message_extracted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "requests"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(vec![ChatMessage::user("hi")])
        .await
        .unwrap_err();

    match err {
        CompletionsError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Rate limit reached");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(vec![ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionsError::EmptyReply));
}

#[tokio::test]
async fn test_unreachable_upstream_is_network_error() {
    let config = CompletionsConfig::builder()
        .api_key("test-key")
        .api_url("http://127.0.0.1:1")
        .build();
    let client = CompletionsClient::new(config).unwrap();

    let err = client
        .complete(vec![ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionsError::Network(_)));
}
