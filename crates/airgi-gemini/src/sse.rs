// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for `streamGenerateContent?alt=sse` responses.
//!
//! Gemini sends unnamed `data:` events, each carrying one complete
//! [`GenerateContentResponse`] chunk.

use std::pin::Pin;

use airgi_core::AirgiError;
use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};

use crate::types::GenerateContentResponse;

/// Parses a streaming response into response chunks.
///
/// Blank keep-alive events are skipped. A chunk that fails to decode ends
/// up as an `Err` item; the caller decides whether to stop.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<GenerateContentResponse, AirgiError>> + Send>> {
    let mapped = response
        .bytes_stream()
        .eventsource()
        .filter_map(|result| async move {
            match result {
                Ok(event) => {
                    let data = event.data.trim();
                    if data.is_empty() {
                        return None;
                    }
                    Some(
                        serde_json::from_str::<GenerateContentResponse>(data).map_err(|e| {
                            AirgiError::assistant(format!("failed to parse stream chunk: {e}"), e)
                        }),
                    )
                }
                Err(e) => Some(Err(AirgiError::Assistant {
                    message: format!("SSE stream error: {e}"),
                    source: None,
                })),
            }
        });

    Box::pin(mapped)
}
