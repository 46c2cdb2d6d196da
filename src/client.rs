use crate::config::LlmSettings;
use crate::error::AppError;
use crate::session::FragmentSink;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        let base = if self.settings.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            &self.settings.base_url
        };
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    async fn post(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, AppError> {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Http(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AppError::Api(format!("API error ({status}): {error_text}")));
        }

        Ok(response)
    }

    /// Single-shot completion: one request, one full response body.
    pub async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let response = self.post(prompt, false).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Http(format!("failed to parse JSON response: {e}")))?;

        body.choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AppError::Api("no response content".to_string()))
    }

    /// Streaming completion: each incremental text fragment is pushed into
    /// `sink` as it arrives. Returns the accumulated response text.
    pub async fn stream(
        &self,
        prompt: &str,
        sink: &mut dyn FragmentSink,
    ) -> Result<String, AppError> {
        let mut response = self.post(prompt, true).await?;

        let mut buffer: Vec<u8> = Vec::new();
        let mut full = String::new();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::Http(format!("stream read failed: {e}")))?
        {
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(fragment) = parse_sse_line(&line) {
                    match fragment {
                        SseEvent::Fragment(text) => {
                            sink.write_fragment(&text)?;
                            full.push_str(&text);
                        }
                        SseEvent::Done => {
                            sink.finish()?;
                            return Ok(full);
                        }
                    }
                }
            }
        }

        sink.finish()?;
        Ok(full)
    }
}

enum SseEvent {
    Fragment(String),
    Done,
}

/// Decodes one server-sent-event line. Lines without a `data:` field (blank
/// keep-alives, `event:` headers) and payloads that fail to parse are
/// ignored.
fn parse_sse_line(line: &[u8]) -> Option<SseEvent> {
    let line = std::str::from_utf8(line).ok()?.trim_end_matches(&['\n', '\r'][..]);
    let payload = line.strip_prefix("data:")?.trim_start();
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => {
            let text = chunk
                .choices
                .first()
                .and_then(|c| c.delta.content.clone())?;
            Some(SseEvent::Fragment(text))
        }
        Err(err) => {
            debug!("skipping unparseable stream line: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::VecSink;
    use httpmock::prelude::*;
    use serde_json::json;

    fn settings(base_url: &str) -> LlmSettings {
        LlmSettings {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
        }
    }

    #[test]
    fn endpoint_falls_back_to_default_base_url() {
        let client = LlmClient::new(settings("")).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let client = LlmClient::new(settings("https://proxy.test/v1/")).unwrap();
        assert_eq!(client.endpoint(), "https://proxy.test/v1/chat/completions");
    }

    #[tokio::test]
    async fn complete_posts_expected_payload_and_headers() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("Authorization", "Bearer test-key")
                    .header("Content-Type", "application/json")
                    .json_body(json!({
                        "model": "test-model",
                        "messages": [
                            { "role": "user", "content": "ping" }
                        ],
                        "stream": false
                    }));

                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "content": "pong" } }
                    ]
                }));
            })
            .await;

        let client = LlmClient::new(settings(&server.base_url())).unwrap();
        let content = client.complete("ping").await.expect("request should succeed");

        assert_eq!(content, "pong");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn complete_maps_http_error_status_to_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(401).body("bad key");
            })
            .await;

        let client = LlmClient::new(settings(&server.base_url())).unwrap();
        let err = client.complete("ping").await.unwrap_err();
        assert!(matches!(err, AppError::Api(_)));
    }

    #[tokio::test]
    async fn stream_feeds_fragments_to_sink_until_done() {
        let server = MockServer::start_async().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{}}]}\n\n",
            "data: [DONE]\n\n",
        );
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .header("Content-Type", "text/event-stream")
                    .body(body);
            })
            .await;

        let client = LlmClient::new(settings(&server.base_url())).unwrap();
        let mut sink = VecSink::default();
        let full = client.stream("ping", &mut sink).await.unwrap();

        assert_eq!(full, "Hello");
        assert_eq!(sink.fragments, vec!["Hel".to_string(), "lo".to_string()]);
        assert!(sink.finished);
    }

    #[test]
    fn sse_lines_without_data_field_are_ignored() {
        assert!(parse_sse_line(b"\n").is_none());
        assert!(parse_sse_line(b"event: ping\n").is_none());
        assert!(parse_sse_line(b"data: not-json\n").is_none());
    }
}
