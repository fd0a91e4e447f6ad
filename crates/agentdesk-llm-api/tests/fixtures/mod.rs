//! Canned provider replies mounted on a wiremock server

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_KEY: &str = "test-api-key";

fn completion(message: Value, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-fixture",
        "object": "chat.completion",
        "model": "gpt-4o",
        "choices": [{ "index": 0, "message": message, "finish_reason": finish_reason }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 },
    })
}

/// Text reply on `/v1/chat/completions`, only for requests carrying the test key
pub async fn openai_text(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", format!("Bearer {}", TEST_KEY).as_str()))
        .and(body_partial_json(json!({ "model": "gpt-4o" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(json!({ "role": "assistant", "content": text }), "stop")),
        )
        .mount(server)
        .await;
}

/// Assistant turn that asks for `read_file` and has `content: null`
pub async fn openai_tool_call(server: &MockServer) {
    let message = json!({
        "role": "assistant",
        "content": null,
        "tool_calls": [{
            "id": "call_1",
            "type": "function",
            "function": { "name": "read_file", "arguments": "{\"file_name\":\"app.py\"}" },
        }],
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(message, "tool_calls")))
        .mount(server)
        .await;
}

pub async fn failure(server: &MockServer, route: &str, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn anthropic_text(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", TEST_KEY))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({ "system": "Be nice" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_fixture",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 12, "output_tokens": 8 },
        })))
        .mount(server)
        .await;
}

/// Embeddings reply with the entries deliberately listed last-index-first
pub async fn embeddings(server: &MockServer, vectors: &[Vec<f32>]) {
    let data: Vec<Value> = vectors
        .iter()
        .enumerate()
        .rev()
        .map(|(index, embedding)| json!({ "object": "embedding", "index": index, "embedding": embedding }))
        .collect();

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({ "model": "text-embedding-3-small", "dimensions": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "data": data })))
        .mount(server)
        .await;
}
