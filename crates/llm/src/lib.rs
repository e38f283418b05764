//! Language-model providers
//!
//! Features:
//! - `LlmBackend` trait: messages in, one completion out
//! - OpenAI-compatible chat completions (OpenAI, Groq)
//! - Anthropic Messages API
//! - `LlmFactory` resolving a backend from settings
//!
//! Backends never retry. A failed call is reported once and the caller
//! decides what to do with it.

pub mod backend;
pub mod claude;
pub mod factory;
pub mod prompt;

pub use backend::{FinishReason, GenerationResult, LlmBackend, OpenAIBackend, OpenAIConfig};
pub use claude::{ClaudeBackend, ClaudeConfig};
pub use factory::{LlmFactory, LlmProvider, LlmProviderConfig};
pub use prompt::{Message, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Raised before any request was sent
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::Configuration(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
