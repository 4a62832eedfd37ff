// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the Gemini adapter against a mock server.

use airgi_config::model::AssistantConfig;
use airgi_core::{AirgiError, AssistantAdapter, OutgoingTurn};
use airgi_gemini::GeminiAssistant;
use futures::StreamExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: &str) -> AssistantConfig {
    AssistantConfig {
        api_key: Some("k".into()),
        model: "gemini-test".into(),
        base_url: base_url.to_string(),
        ..AssistantConfig::default()
    }
}

fn chunk(text: &str) -> String {
    format!(
        "data: {{\"candidates\":[{{\"content\":{{\"role\":\"model\",\"parts\":[{{\"text\":\"{text}\"}}]}}}}]}}\n\n"
    )
}

async fn drain(mut stream: airgi_core::FragmentStream) -> Result<String, AirgiError> {
    let mut reply = String::new();
    while let Some(fragment) = stream.next().await {
        reply.push_str(&fragment?);
    }
    Ok(reply)
}

#[tokio::test]
async fn fragments_arrive_in_order_and_concatenate() {
    let server = MockServer::start().await;
    let body = format!("{}{}{}", chunk("Gracias, "), chunk("¿en qué "), chunk("navegador?"));
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:streamGenerateContent"))
        .and(body_partial_json(serde_json::json!({
            "systemInstruction": {"parts": [{"text": "Eres AIRGI"}]}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    let assistant = GeminiAssistant::new(&config(&server.uri())).unwrap();
    let session = assistant.open_session("Eres AIRGI", Vec::new()).await.unwrap();
    let stream = assistant
        .send_turn(&session, &OutgoingTurn::text("El login falla"))
        .await
        .unwrap();

    assert_eq!(drain(stream).await.unwrap(), "Gracias, ¿en qué navegador?");
}

#[tokio::test]
async fn blocked_prompt_surfaces_as_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string("data: {\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}\n\n"),
        )
        .mount(&server)
        .await;

    let assistant = GeminiAssistant::new(&config(&server.uri())).unwrap();
    let session = assistant.open_session("", Vec::new()).await.unwrap();
    let stream = assistant
        .send_turn(&session, &OutgoingTurn::text("hola"))
        .await
        .unwrap();

    let err = drain(stream).await.unwrap_err();
    assert!(err.to_string().contains("SAFETY"), "got: {err}");
}

#[tokio::test]
async fn rejected_request_fails_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"code": 403, "message": "permission denied", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let assistant = GeminiAssistant::new(&config(&server.uri())).unwrap();
    let session = assistant.open_session("", Vec::new()).await.unwrap();
    let result = assistant.send_turn(&session, &OutgoingTurn::text("hola")).await;
    assert!(matches!(result, Err(AirgiError::Assistant { .. })));
}
