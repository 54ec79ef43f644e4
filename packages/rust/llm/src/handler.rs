//! Model backend handlers: a closed set of service variants behind one
//! request/response contract.
//!
//! Each variant differs in authentication, base endpoint, and payload shape.
//! Adding a backend means adding a variant plus its payload match arms; the
//! selection surface stays a single configuration value.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use readmegen_shared::{AppConfig, ReadmeGenError, Result, api_key_env};

use crate::tokens::token_handler;

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("readmegen/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout. Generation is slow; connection hangs still fail.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const VSEGPT_BASE_URL: &str = "https://api.vsegpt.ru/v1";

// ---------------------------------------------------------------------------
// PromptBackend
// ---------------------------------------------------------------------------

/// Seam between the dispatch engine and a concrete backend, so tests can
/// inject an instrumented fake (latency, failure injection, concurrency
/// high-water tracking).
#[async_trait]
pub trait PromptBackend: Send + Sync {
    /// Generate text for one prompt job. Failures must be attributable to
    /// `index` so the caller can place an error marker at the job's
    /// position.
    async fn complete(
        &self,
        index: usize,
        prompt: &str,
        tokens: usize,
        temperature: f32,
    ) -> Result<String>;
}

// ---------------------------------------------------------------------------
// LlmService
// ---------------------------------------------------------------------------

/// Supported backend services, selected by the `llm.api` config value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmService {
    /// Self-hosted inference endpoint with a bespoke JSON envelope.
    Llama,
    /// Hosted OpenAI chat-completions API.
    OpenAi,
    /// Hosted VseGPT API (OpenAI-compatible).
    VseGpt,
}

impl LlmService {
    /// Stable identifier matching the config value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llama => "llama",
            Self::OpenAi => "openai",
            Self::VseGpt => "vsegpt",
        }
    }
}

impl std::str::FromStr for LlmService {
    type Err = ReadmeGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "llama" => Ok(Self::Llama),
            "openai" => Ok(Self::OpenAi),
            "vsegpt" => Ok(Self::VseGpt),
            other => Err(ReadmeGenError::UnsupportedService {
                service: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

/// Self-hosted request envelope.
#[derive(Debug, Serialize)]
struct SelfHostedRequest<'a> {
    request_id: String,
    meta: SelfHostedMeta,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct SelfHostedMeta {
    temperature: f32,
    tokens_limit: usize,
}

/// Self-hosted response body: generated text under `content`.
#[derive(Debug, Deserialize)]
struct SelfHostedResponse {
    content: String,
}

/// OpenAI-compatible chat-completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// OpenAI-compatible response: text under `choices[0].message.content`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// ModelHandler
// ---------------------------------------------------------------------------

/// Owns credentials, request shaping, and response unwrapping for the
/// configured backend service.
#[derive(Debug)]
pub struct ModelHandler {
    service: LlmService,
    client: reqwest::Client,
    base_url: String,
    model: String,
    context_window: usize,
    system_message: String,
}

impl ModelHandler {
    /// Build the handler selected by `llm.api`.
    ///
    /// An unrecognized service value fails with
    /// [`ReadmeGenError::UnsupportedService`] before any network activity;
    /// a hosted service with no API key in its environment variable fails
    /// with a config error.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let service: LlmService = config.llm.api.parse()?;

        let base_url = match service {
            LlmService::Llama => {
                if config.llm.url.is_empty() {
                    return Err(ReadmeGenError::config(
                        "llm.url is required for the self-hosted 'llama' backend",
                    ));
                }
                config.llm.url.clone()
            }
            LlmService::OpenAi if config.llm.url.is_empty() => OPENAI_BASE_URL.to_string(),
            LlmService::VseGpt if config.llm.url.is_empty() => VSEGPT_BASE_URL.to_string(),
            _ => config.llm.url.clone(),
        };

        let api_key = match api_key_env(service.as_str()) {
            Some(var) => match std::env::var(var) {
                Ok(key) if !key.is_empty() => Some(key),
                _ => {
                    return Err(ReadmeGenError::config(format!(
                        "API key for '{}' not found: set {var}",
                        service.as_str()
                    )));
                }
            },
            None => None,
        };

        Self::from_parts(
            service,
            base_url,
            config.llm.model.clone(),
            config.llm.tokens,
            config.api.system_message.clone(),
            api_key,
        )
    }

    /// Assemble a handler from already-resolved parts. Exposed so tests can
    /// point a handler at a mock server without touching the environment.
    pub fn from_parts(
        service: LlmService,
        base_url: String,
        model: String,
        context_window: usize,
        system_message: String,
        api_key: Option<String>,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = &api_key {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ReadmeGenError::config("API key contains invalid characters"))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReadmeGenError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            service,
            client,
            base_url,
            model,
            context_window,
            system_message,
        })
    }

    /// Which service this handler talks to.
    pub fn service(&self) -> LlmService {
        self.service
    }

    fn endpoint(&self) -> String {
        match self.service {
            // The configured URL is the full inference endpoint.
            LlmService::Llama => self.base_url.clone(),
            LlmService::OpenAi | LlmService::VseGpt => {
                format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
            }
        }
    }

    /// Issue one backend request for a prompt job.
    ///
    /// The token handler fits the prompt to the context window first. A
    /// non-2xx status or a response missing the expected text field fails
    /// with [`ReadmeGenError::Request`] carrying `index`, never silent
    /// empty text.
    pub async fn make_request(
        &self,
        index: usize,
        prompt: &str,
        tokens: usize,
        temperature: f32,
    ) -> Result<(usize, String)> {
        let prompt = token_handler(self.context_window, index, prompt.to_string());
        let endpoint = self.endpoint();

        debug!(
            index,
            service = self.service.as_str(),
            tokens,
            "dispatching backend request"
        );

        let response = match self.service {
            LlmService::Llama => {
                let payload = SelfHostedRequest {
                    request_id: Uuid::new_v4().to_string(),
                    meta: SelfHostedMeta {
                        temperature,
                        tokens_limit: tokens,
                    },
                    content: &prompt,
                };
                self.client.post(&endpoint).json(&payload).send().await
            }
            LlmService::OpenAi | LlmService::VseGpt => {
                let payload = ChatRequest {
                    model: &self.model,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: &self.system_message,
                        },
                        ChatMessage {
                            role: "user",
                            content: &prompt,
                        },
                    ],
                    temperature,
                    max_tokens: tokens,
                };
                self.client.post(&endpoint).json(&payload).send().await
            }
        }
        .map_err(|e| ReadmeGenError::request(index, format!("network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReadmeGenError::request(index, format!("HTTP {status}")));
        }

        let text = match self.service {
            LlmService::Llama => {
                let body: SelfHostedResponse = response
                    .json()
                    .await
                    .map_err(|e| ReadmeGenError::request(index, format!("malformed body: {e}")))?;
                body.content
            }
            LlmService::OpenAi | LlmService::VseGpt => {
                let body: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| ReadmeGenError::request(index, format!("malformed body: {e}")))?;
                body.choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| {
                        ReadmeGenError::request(index, "response missing generated text")
                    })?
            }
        };

        if text.is_empty() {
            return Err(ReadmeGenError::request(index, "empty response text"));
        }

        Ok((index, text))
    }
}

#[async_trait]
impl PromptBackend for ModelHandler {
    async fn complete(
        &self,
        index: usize,
        prompt: &str,
        tokens: usize,
        temperature: f32,
    ) -> Result<String> {
        let (_, text) = self.make_request(index, prompt, tokens, temperature).await?;
        Ok(text)
    }
}
