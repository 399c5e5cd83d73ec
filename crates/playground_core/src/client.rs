//! Completion client boundary and the OpenAI-compatible HTTP implementation.
//!
//! The sweep executor only sees the [`CompletionClient`] trait. Tests and
//! benchmarks substitute closures; the CLI injects an [`OpenAiClient`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::model::ParameterSet;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed for one chat completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub parameters: ParameterSet,
    pub stop: Option<&'a str>,
}

/// Something that can turn a request into generated text
pub trait CompletionClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, CompletionError>;
}

impl<F> CompletionClient for F
where
    F: Fn(&CompletionRequest<'_>) -> Result<String, CompletionError>,
{
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, CompletionError> {
        self(request)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
    presence_penalty: f64,
    frequency_penalty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&CompletionRequest<'a>> for ChatCompletionBody<'a> {
    fn from(request: &CompletionRequest<'a>) -> Self {
        let params = &request.parameters;
        Self {
            model: request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            temperature: params.temperature(),
            max_tokens: params.max_tokens(),
            presence_penalty: params.presence_penalty(),
            frequency_penalty: params.frequency_penalty(),
            stop: request.stop,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extract the generated text from a chat completion body
fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(format!("malformed JSON: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::InvalidResponse("response contained no choices".into()))
}

/// Best-effort human-readable message from an error body
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

// ============================================================================
// HTTP client
// ============================================================================

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Clone)]
pub struct OpenAiClient {
    agent: ureq::Agent,
    api_base: String,
    api_key: String,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_options(DEFAULT_API_BASE, api_key, DEFAULT_TIMEOUT)
    }

    /// Client for a custom base URL (e.g. a proxy or a local server)
    ///
    /// `timeout` bounds each request end to end.
    pub fn with_options(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let api_base = api_base.into().trim_end_matches('/').to_string();

        Self {
            agent,
            api_base,
            api_key: api_key.into(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, CompletionError> {
        let body = ChatCompletionBody::from(request);

        tracing::trace!(model = request.model, "POST {}", self.endpoint());

        let response = self
            .agent
            .post(&self.endpoint())
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body);

        match response {
            Ok(resp) => {
                let text = resp
                    .into_string()
                    .map_err(|e| CompletionError::Transport(format!("failed to read body: {e}")))?;
                parse_completion(&text)
            }
            Err(ureq::Error::Status(status, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                Err(CompletionError::Api {
                    status,
                    message: api_error_message(&text),
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(CompletionError::Transport(transport.to_string()))
            }
        }
    }
}
