//! Wiremock integration tests for AnthropicBackend.
#![cfg(feature = "anthropic")]

use heimdall::{AnthropicBackend, ChatBackend, ChatRequest, HeimdallError, Message};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn messages_body() -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4",
        "content": [
            { "type": "text", "text": "Hello" },
            { "type": "tool_use", "id": "t1", "name": "noop", "input": {} },
            { "type": "text", "text": ", world" }
        ],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 10, "output_tokens": 5 }
    })
}

#[tokio::test]
async fn messages_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test_key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-sonnet-4",
            "system": "be brief",
            "messages": [{ "role": "user", "content": "hi" }],
            "max_tokens": 1024,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = AnthropicBackend::with_base_url("test_key", mock_server.uri()).unwrap();
    let request = ChatRequest::new(
        "claude-sonnet-4",
        vec![Message::system("be brief"), Message::user("hi")],
    );

    let response = backend.chat_completion(&request).await.unwrap();
    assert_eq!(response.id, "msg_01");
    assert_eq!(response.object, "chat.completion");
    assert!(response.created > 0);
    assert_eq!(response.model, "claude-sonnet-4");
    assert_eq!(response.choices.len(), 1);
    assert_eq!(response.content(), Some("Hello, world"));
    assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
}

#[tokio::test]
async fn explicit_max_tokens_is_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({ "max_tokens": 64, "temperature": 0.2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = AnthropicBackend::with_base_url("test_key", mock_server.uri()).unwrap();
    let request = ChatRequest::new("claude-3", vec![Message::user("hi")])
        .max_tokens(64)
        .temperature(0.2);
    backend.chat_completion(&request).await.unwrap();
}

#[tokio::test]
async fn error_status_maps_to_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" }
        })))
        .mount(&mock_server)
        .await;

    let backend = AnthropicBackend::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = backend
        .chat_completion(&ChatRequest::new("claude-3", vec![Message::user("hi")]))
        .await
        .unwrap_err();

    match err {
        HeimdallError::Api { status, message } => {
            assert_eq!(status, 529);
            assert!(message.contains("Overloaded"), "{message}");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    // nothing listens on port 9 on a test host
    let backend = AnthropicBackend::with_base_url("test_key", "http://127.0.0.1:9").unwrap();
    let result = backend
        .chat_completion(&ChatRequest::new("claude-3", vec![Message::user("hi")]))
        .await;
    assert!(matches!(result, Err(HeimdallError::Http(_))));
}
