//! Integration tests for the Gemini driver against a local mockito server.

use fluent_llm::drivers::gemini::GeminiModel;
use fluent_llm::drivers::GeminiDriver;
use fluent_llm::{CancellationToken, Error, Model};
use mockito::{Matcher, Server, ServerGuard};
use serde::Deserialize;
use serde_json::json;

const PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn model_for(server: &ServerGuard, api_key: Option<&str>) -> GeminiModel {
    let driver = GeminiDriver::new().with_base_url(server.url()).unwrap();
    let mut builder = Model::builder(driver, "gemini-2.0-flash");
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    builder.build().unwrap()
}

fn reply_with_parts(parts: serde_json::Value) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": parts },
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 4,
            "candidatesTokenCount": 6,
            "totalTokenCount": 10
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_plain_prompt_request_shape() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_header(
            "x-request-id",
            Matcher::Regex("^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}$".into()),
        )
        // Exact match: a plain prompt carries no generationConfig.
        .match_body(Matcher::Json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(reply_with_parts(json!([{ "text": "Hi there" }])))
        .create_async()
        .await;

    let model = model_for(&server, Some("test-key"));
    let response = model
        .prompt("Hello")
        .execute(&CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.text(), "Hi there");
    assert_eq!(response.finish_reason(), Some("stop"));
    assert_eq!(response.usage().unwrap().total_tokens, 10);
}

#[derive(Debug, Deserialize, PartialEq)]
struct Country {
    name: String,
    population_millions: f64,
}

#[tokio::test]
async fn test_structured_prompt_sends_schema() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "title": "country",
                    "propertyOrdering": ["name", "population_millions"],
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "STRING" },
                        "population_millions": { "type": "NUMBER", "description": "In millions" }
                    }
                }
            }
        })))
        .with_status(200)
        .with_body(reply_with_parts(json!([
            { "text": "{\"name\": \"Norway\", " },
            { "text": "\"population_millions\": 5.5}" }
        ])))
        .create_async()
        .await;

    let model = model_for(&server, Some("test-key"));
    let b = model.new_schema();
    let schema = b.object(
        "country",
        vec![
            b.string("name", vec![b.required()]).into(),
            b.number("population_millions", vec![b.description("In millions")])
                .into(),
        ],
    );

    let response = model
        .prompt("Describe Norway")
        .with_schema(schema)
        .execute(&CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    let country: Country = response.decode().unwrap();
    assert_eq!(
        country,
        Country {
            name: "Norway".into(),
            population_millions: 5.5
        }
    );
}

#[tokio::test]
async fn test_thought_parts_are_skipped() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(reply_with_parts(json!([
            { "text": "Let me think about it.", "thought": true },
            { "text": "Forty" },
            { "text": "-two" }
        ])))
        .create_async()
        .await;

    let model = model_for(&server, Some("test-key"));
    let response = model
        .prompt("Answer?")
        .execute(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.text(), "Forty-two");
}

#[tokio::test]
async fn test_rate_limit_maps_to_retryable_remote_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(429)
        .with_body(r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let model = model_for(&server, Some("test-key"));
    let err = model
        .prompt("Hello")
        .execute(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_generation());
    assert!(err.is_retryable());
    match err {
        Error::Remote {
            status, message, ..
        } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
    // The connection itself was fine and stays cached.
    assert!(model.is_connected());
}

#[tokio::test]
async fn test_bad_request_is_not_retryable() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(400)
        .with_body(r#"{"error": {"code": 400, "message": "Invalid JSON payload"}}"#)
        .create_async()
        .await;

    let model = model_for(&server, Some("test-key"));
    let err = model
        .prompt("Hello")
        .execute(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Remote { status: 400, retryable: false, .. }));
}

#[tokio::test]
async fn test_missing_api_key_fails_before_any_request() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", PATH).expect(0).create_async().await;

    let model = model_for(&server, None);
    let err = model
        .prompt("Hello")
        .execute(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_connection());
    assert!(!model.is_connected());
    mock.assert_async().await;
}
