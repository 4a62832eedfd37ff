// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` API.
//!
//! Provides [`GeminiClient`] which handles request construction,
//! authentication, streaming SSE responses, and transient error retry.

use std::pin::Pin;
use std::time::Duration;

use airgi_core::AirgiError;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse;
use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Stream of decoded response chunks.
pub type ChunkStream =
    Pin<Box<dyn Stream<Item = Result<GenerateContentResponse, AirgiError>> + Send>>;

/// HTTP client for Gemini API communication.
///
/// Manages the API key header, connection pooling, and retry logic for
/// transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
    max_retries: u32,
}

impl GeminiClient {
    /// Creates a new client for `model` served from `base_url`.
    pub fn new(api_key: &str, model: String, base_url: String) -> Result<Self, AirgiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| AirgiError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| AirgiError::assistant(format!("failed to build HTTP client: {e}"), e))?;

        Ok(Self {
            client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    /// Sends a streaming request and returns the decoded chunks.
    ///
    /// On transient errors, retries once after a 1-second delay.
    pub async fn stream_generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream, AirgiError> {
        let url = self.stream_url();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| AirgiError::assistant(format!("HTTP request failed: {e}"), e))?;

            let status = response.status();
            debug!(status = %status, attempt, "streaming response received");

            if status.is_success() {
                return Ok(sse::parse_sse_stream(response));
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(AirgiError::Assistant {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gemini API error ({} {}): {}",
                    api_err.error.code, api_err.error.status, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(AirgiError::Assistant {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| AirgiError::Assistant {
            message: "streaming request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, Part};
    use futures::StreamExt;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STREAM_PATH: &str = "/v1beta/models/gemini-test:streamGenerateContent";

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new("test-api-key", "gemini-test".into(), format!("{base_url}/")).unwrap()
    }

    fn test_request() -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::new("user", vec![Part::text("Hola")])],
        }
    }

    fn sse_body(text: &str) -> String {
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"role\":\"model\",\"parts\":[{{\"text\":\"{text}\"}}]}}}}]}}\n\n"
        )
    }

    #[tokio::test]
    async fn stream_sends_key_and_alt_sse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .and(query_param("alt", "sse"))
            .and(header("x-goog-api-key", "test-api-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body("ok")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client.stream_generate(&test_request()).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().text(), "ok");
    }

    #[tokio::test]
    async fn stream_retries_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body("after retry")),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client.stream_generate(&test_request()).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().text(), "after retry");
    }

    #[tokio::test]
    async fn stream_fails_on_400_with_api_message() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
        });
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = match client.stream_generate(&test_request()).await {
            Ok(_) => panic!("expected failure"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("INVALID_ARGUMENT"), "got: {err}");
    }

    #[tokio::test]
    async fn stream_exhausts_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.stream_generate(&test_request()).await.is_err());
    }
}
