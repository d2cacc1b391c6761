//! Helpers for tests that talk to a mocked chat-completion API.

use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::{Assistant, AssistantConfig};

/// The reply used in the example scenario: a grocery expense.
pub const EXAMPLE_REPLY: &str = r#"{"action":"add_tx","tipo":"expense","desc":"mercado","val":50.0,"cat":"Mercado","data":"2024-01-15"}"#;

/// A chat-completion response whose assistant message is `content`.
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "deepseek-chat",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ],
        "usage": { "prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150 }
    })
}

/// Answer completion requests on `server` with `content`, expecting exactly
/// `expected_calls` of them.
pub async fn mount_completion(server: &MockServer, content: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// An assistant with a fake API key that calls `server`.
pub fn test_assistant(server: &MockServer) -> Assistant {
    Assistant::new(AssistantConfig::new(Some("sk-test")).with_api_base_url(&server.uri()))
        .expect("Could not create assistant")
}
