//! Anthropic Messages API backend
//!
//! System messages are lifted into the request's `system` field; the API
//! rejects them inside `messages`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::{FinishReason, GenerationResult, LlmBackend};
use crate::prompt::{Message, Role};
use crate::LlmError;

pub const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for Claude backend
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    /// Model ID, e.g. `claude-sonnet-4-20250514`
    pub model: String,
    pub max_tokens: usize,
    /// Temperature (0.0 - 1.0)
    pub temperature: f32,
    pub timeout: Duration,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 2000,
            temperature: 0.1,
            timeout: Duration::from_secs(30),
            endpoint: ANTHROPIC_ENDPOINT.to_string(),
        }
    }
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Anthropic accepts 0.0 - 1.0 only
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

pub struct ClaudeBackend {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeBackend {
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_request(&self, messages: &[Message]) -> ClaudeRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        ClaudeRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| ClaudeMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: Some(self.config.temperature),
        }
    }
}

#[async_trait]
impl LlmBackend for ClaudeBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let request = self.build_request(messages);

        tracing::debug!(model = %self.config.model, "Sending Anthropic message");

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: ClaudeApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(GenerationResult {
            text: response.text(),
            tokens: response.usage.map(|u| u.output_tokens).unwrap_or(0),
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: FinishReason::from_provider(response.stop_reason.as_deref()),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// =============================================================================
// Claude API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContentBlock>,
    stop_reason: Option<String>,
    usage: Option<ClaudeUsage>,
}

impl ClaudeApiResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text.as_str()),
                ClaudeContentBlock::Other => None,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    output_tokens: usize,
}
