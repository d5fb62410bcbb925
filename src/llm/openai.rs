//! `OpenAI`-compatible chat completions provider (`OpenRouter` by default)

use super::types::{ChatRole, CompletionRequest, Fragment, FragmentStream};
use super::{CompletionService, LlmError};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct:free";

const DONE_SENTINEL: &str = "[DONE]";
const APP_TITLE: &str = "Health & Wellness Chatbot";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an `OpenAI`-compatible endpoint
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Streaming chat completions over server-sent events
pub struct OpenAICompatService {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAICompatService {
    pub fn new(config: &ProviderConfig) -> Result<Self, LlmError> {
        // No overall request timeout: the stream may legitimately run long.
        // The turn processor owns the deadline.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    fn translate_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.api_name(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: request.stream,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAICompatService {
    async fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, LlmError> {
        let body = self.translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;
            let message = match serde_json::from_str::<OpenAIErrorResponse>(&body) {
                Ok(error_resp) => error_resp.error.message,
                Err(_) => body,
            };
            return Err(LlmError::from_status(status.as_u16(), &message));
        }

        Ok(decode_events(response.bytes_stream()))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Turn a raw SSE body into fragments.
///
/// The stream ends cleanly only at `[DONE]`. A body that closes before it
/// yields a malformed-response error, and a transport or chunk error ends
/// the stream after being yielded.
fn decode_events<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let events = Box::pin(body.eventsource());
    let fragments = stream::unfold(Some(events), |state| async move {
        let Some(mut events) = state else {
            return None;
        };
        loop {
            let failure = match events.next().await {
                Some(Ok(event)) if event.data == DONE_SENTINEL => return None,
                Some(Ok(event)) => match parse_chunk(&event.data) {
                    Ok(Some(fragment)) => return Some((Ok(fragment), Some(events))),
                    Ok(None) => continue,
                    Err(e) => e,
                },
                Some(Err(e)) => LlmError::network(format!("SSE stream error: {e}")),
                None => LlmError::malformed("Stream ended before the completion finished"),
            };
            return Some((Err(failure), None));
        }
    });
    Box::pin(fragments)
}

/// Decode one SSE `data:` payload into a fragment.
///
/// Returns `Ok(None)` for keep-alive or metadata chunks that carry no text.
fn parse_chunk(data: &str) -> Result<Option<Fragment>, LlmError> {
    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
        LlmError::malformed(format!("Failed to parse stream chunk: {e} - data: {data}"))
    })?;

    if let Some(error) = chunk.error {
        return Err(LlmError::server_error(format!(
            "Provider error: {}",
            error.message
        )));
    }

    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };

    // Only the first delta of a completion usually names its role
    let role = choice
        .delta
        .role
        .as_deref()
        .and_then(ChatRole::from_api_name)
        .unwrap_or(ChatRole::Assistant);

    match choice.delta.content {
        Some(text) if !text.is_empty() => Ok(Some(Fragment { role, text })),
        _ => Ok(None),
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<OpenAIError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
