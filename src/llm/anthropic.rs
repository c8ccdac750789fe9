//! Anthropic Messages API client.

use super::{Completion, CompletionClient, CompletionRequest, Message, ToolDefinition};
use crate::error::{PensumError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Default timeout for completion requests (2 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Deterministic sampling: retrieval answers should not vary across runs.
const TEMPERATURE: f32 = 0.0;

/// HTTP client for the `/v1/messages` endpoint.
///
/// Non-streaming only. Transport and API failures surface as
/// [`PensumError::Completion`]; this layer never retries.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a client for the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            max_tokens: 800,
        })
    }

    /// Override the API base URL (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the output token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn body<'a>(&'a self, request: &CompletionRequest<'a>) -> MessagesBody<'a> {
        MessagesBody {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
            system: request.system,
            messages: request.messages,
            tools: request.tools,
            tool_choice: request.tools.map(|_| json!({"type": "auto"})),
        }
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(model = %self.model, messages = request.messages.len(), "requesting completion");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PensumError::Completion(describe_api_error(status, &text)));
        }

        let completion: Completion = response.json().await?;
        debug!(stop_reason = ?completion.stop_reason, blocks = completion.content.len(), "completion received");
        Ok(completion)
    }
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Prefer the structured `{"error": {...}}` body; fall back to raw text.
fn describe_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => format!("{}: {}: {}", status, envelope.error.kind, envelope.error.message),
        Err(_) => format!("{}: {}", status, body),
    }
}
