//! LLM backend trait and the OpenAI-compatible backend
//!
//! Groq serves the OpenAI chat-completions API under its own base URL, so one
//! backend covers both providers.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::prompt::Message;
use crate::LlmError;

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    /// Completion tokens reported by the provider
    pub tokens: usize,
    /// Wall-clock time of the request (ms)
    pub total_time_ms: u64,
    pub finish_reason: FinishReason,
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Other,
}

impl FinishReason {
    pub(crate) fn from_provider(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") | Some("end_turn") | Some("stop_sequence") | None => FinishReason::Stop,
            Some("length") | Some("max_tokens") => FinishReason::Length,
            Some(_) => FinishReason::Other,
        }
    }
}

/// LLM Backend trait
///
/// One call is one request. Implementations must not retry.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a single completion
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL, without `/chat/completions`
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: OPENAI_ENDPOINT.to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.1,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAIConfig {
    /// Create config for OpenAI
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Create config for Groq
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: GROQ_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI-compatible backend
///
/// Works with OpenAI, Groq and local servers exposing the same API.
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        let local = config.endpoint.starts_with("http://localhost")
            || config.endpoint.starts_with("http://127.0.0.1");
        if config.api_key.is_empty() && !local {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();
        if !self.config.api_key.is_empty() {
            let auth_value = format!("Bearer {}", self.config.api_key);
            if let Ok(val) = HeaderValue::from_str(&auth_value) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    fn build_request(&self, messages: &[Message]) -> OpenAIChatRequest {
        OpenAIChatRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            stream: Some(false),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let request = self.build_request(messages);

        tracing::debug!(model = %self.config.model, url = %self.chat_url(), "Sending chat completion");

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(GenerationResult {
            text: choice.message.content.unwrap_or_default(),
            tokens: response.usage.map(|u| u.completion_tokens).unwrap_or(0),
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: FinishReason::from_provider(choice.finish_reason.as_deref()),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    /// Null when the model answered with tool calls only
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    completion_tokens: usize,
}
