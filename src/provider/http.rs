//! Shared HTTP client, SSE framing, and auth headers.

use std::sync::OnceLock;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::warn;

use super::RawEventStream;
use crate::error::RobotError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// Only connecting is bounded here; whole-response bounds belong to the
/// response adapters, since a stream may legitimately run for minutes.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Anthropic-style headers (x-api-key).
pub fn anthropic_headers(api_key: &str, version: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("x-api-key", val);
    }
    if let Ok(val) = HeaderValue::from_str(version) {
        headers.insert("anthropic-version", val);
    }
    headers
}

/// Parse an SSE `data:` line, returning None for other fields and `[DONE]`.
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> RobotError {
    match status {
        401 | 403 => RobotError::Authentication(body.to_string()),
        429 => RobotError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => RobotError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

/// Send a streaming POST and check the status before any events are read.
pub async fn post_stream(
    url: &str,
    headers: HeaderMap,
    body: &serde_json::Value,
) -> Result<RawEventStream, RobotError> {
    let resp = shared_client()
        .post(url)
        .headers(headers)
        .json(body)
        .send()
        .await?;

    let status = resp.status().as_u16();
    if !(200..300).contains(&status) {
        let body_text = resp.text().await.unwrap_or_default();
        return Err(status_to_error(status, &body_text));
    }

    Ok(sse_json_stream(resp))
}

/// Splits an SSE body into decoded lines.
///
/// Bytes are held until a full line has arrived, so a multi-byte character
/// split across two reads decodes intact. Lines that are not valid UTF-8 are
/// logged and dropped.
#[derive(Debug, Default)]
pub(crate) struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Append `bytes` and return every line they complete, trimmed.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            if let Some(line) = decode_line(&raw[..end]) {
                lines.push(line);
            }
        }
        lines
    }

    /// Unterminated final line, if any.
    pub(crate) fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    match std::str::from_utf8(raw) {
        Ok(line) => Some(line.trim().to_string()),
        Err(e) => {
            warn!(error = %e, "skipping SSE line with invalid UTF-8");
            None
        }
    }
}

/// JSON payload of one SSE line; comments, other fields and `[DONE]` give
/// `None`.
fn sse_event(line: &str) -> Option<serde_json::Value> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = parse_sse_data(line)?;
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "skipping malformed SSE payload");
            None
        }
    }
}

/// Turn an SSE response body into a stream of JSON `data:` payloads.
///
/// Malformed payloads are logged and skipped; byte-level failures are
/// yielded as errors and end the stream.
pub fn sse_json_stream(resp: reqwest::Response) -> RawEventStream {
    let byte_stream = resp.bytes_stream();

    let stream = async_stream::stream! {
        let mut lines = SseLineBuffer::default();
        futures::pin_mut!(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(RobotError::Network(e));
                    break;
                }
            };

            for line in lines.push(&chunk) {
                if let Some(event) = sse_event(&line) {
                    yield Ok(event);
                }
            }
        }

        if let Some(event) = lines.finish().as_deref().and_then(sse_event) {
            yield Ok(event);
        }
    };

    Box::pin(stream)
}
