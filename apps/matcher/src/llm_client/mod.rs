//! LLM Client — the single point of entry for Claude API calls made by the
//! LLM-backed dimension analyzers.
//!
//! No other module may call the Anthropic API directly.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Model used by every dimension analyzer. Kept fixed so scores stay comparable across runs.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;
const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const BASE_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("LLM returned no text content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API with retry logic and a JSON helper.
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, api_key })
    }

    /// Sends one prompt and returns the first text block of the reply.
    /// Transport errors, 429 and 5xx responses are retried with exponential backoff;
    /// any other non-success status fails immediately.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error = None;
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = BASE_BACKOFF * 2u32.pow(attempt - 1);
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying LLM call");
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }
            if !status.is_success() {
                let raw = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                    .map(|e| e.error.message)
                    .unwrap_or(raw);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let reply: MessagesResponse = response.json().await?;
            debug!(
                input_tokens = reply.usage.input_tokens,
                output_tokens = reply.usage.output_tokens,
                "LLM call succeeded"
            );
            return reply
                .content
                .into_iter()
                .find(|block| block.block_type == "text")
                .and_then(|block| block.text)
                .ok_or(LlmError::EmptyContent);
        }

        Err(last_error.unwrap_or(LlmError::Exhausted {
            attempts: MAX_ATTEMPTS,
        }))
    }

    /// Like `complete`, but deserializes the reply as JSON. The prompt must ask for JSON.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<T, LlmError> {
        let text = self.complete(system, prompt).await?;
        Ok(serde_json::from_str(strip_json_fences(&text))?)
    }
}

/// Strips a ```json … ``` or ``` … ``` wrapper if the model added one.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let inner = inner.trim_start();
    inner.strip_suffix("```").map(str::trim).unwrap_or(inner)
}
