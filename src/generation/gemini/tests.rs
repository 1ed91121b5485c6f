use super::*;
use crate::config::{ApiKey, GeminiConfig};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn chat_client_for(endpoint: &str) -> GeminiChatClient {
    let config = Config {
        gemini: GeminiConfig {
            endpoint: endpoint.to_string(),
            ..GeminiConfig::default()
        },
        api_key: ApiKey::new("test-key"),
        ..Config::default()
    };
    GeminiChatClient::new(&config).expect("should create chat client")
}

async fn generate_blocking(client: GeminiChatClient, prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || client.generate(&prompt))
        .await
        .expect("blocking task should finish")
}

#[tokio::test]
async fn generate_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Apa itu Pasal 1?"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Menurut Pasal 1 ayat (1), "},
                    {"text": "Negara Indonesia ialah Negara Kesatuan."}
                ]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = generate_blocking(chat_client_for(&server.uri()), "Apa itu Pasal 1?")
        .await
        .expect("generate should succeed");

    assert_eq!(
        answer,
        "Menurut Pasal 1 ayat (1), Negara Indonesia ialah Negara Kesatuan."
    );
}

#[tokio::test]
async fn rate_limit_is_a_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = generate_blocking(chat_client_for(&server.uri()), "pertanyaan")
        .await
        .expect_err("rate limit should fail");

    match err {
        RagError::Generation(message) => {
            assert!(message.contains("429"));
            assert!(message.contains("RESOURCE_EXHAUSTED"));
        }
        other => panic!("expected generation error, got {other:?}"),
    }
}

#[tokio::test]
async fn blocked_prompt_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = generate_blocking(chat_client_for(&server.uri()), "pertanyaan")
        .await
        .expect_err("blocked prompt should fail");

    assert!(matches!(err, RagError::Generation(ref m) if m.contains("SAFETY")));
}

#[test]
fn empty_candidate_text_is_an_error() {
    let response: GenerateResponse = serde_json::from_value(json!({
        "candidates": [{"content": {"parts": [{"text": "  "}]}, "finishReason": "MAX_TOKENS"}]
    }))
    .expect("response parses");

    let err = response.into_text().expect_err("blank answer should fail");
    assert!(matches!(err, RagError::Generation(ref m) if m.contains("MAX_TOKENS")));
}

#[test]
fn missing_candidates_is_an_error() {
    let response: GenerateResponse =
        serde_json::from_value(json!({"candidates": []})).expect("response parses");

    assert!(matches!(
        response.into_text(),
        Err(RagError::Generation(_))
    ));
}
