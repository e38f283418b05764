//! LLM Factory
//!
//! Resolves a backend from [`LlmSettings`]. Resolution fails fast with
//! [`LlmError::Configuration`] on an unknown provider or a missing key, before
//! any request is sent.
//!
//! ## Example
//! ```ignore
//! let config = LlmProviderConfig::from_settings(&settings.llm)?;
//! let llm = LlmFactory::create_backend(&config)?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain_pack_config::LlmSettings;

use crate::{
    backend::{LlmBackend, OpenAIBackend, OpenAIConfig},
    claude::{ClaudeBackend, ClaudeConfig},
    LlmError,
};

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    OpenAI,
    /// Anthropic Messages API
    Anthropic,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Some(LlmProvider::Groq),
            "openai" | "gpt" => Some(LlmProvider::OpenAI),
            "anthropic" | "claude" => Some(LlmProvider::Anthropic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "groq",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "llama-3.3-70b-versatile",
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    /// Environment variable conventionally holding the key
    pub fn key_variable(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified LLM provider configuration
#[derive(Debug, Clone)]
pub struct LlmProviderConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    /// Base URL override
    pub endpoint: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout: Duration,
}

impl LlmProviderConfig {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            provider,
            api_key: None,
            endpoint: None,
            model: provider.default_model().to_string(),
            max_tokens: 2000,
            temperature: 0.1,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let provider = LlmProvider::from_str(&settings.provider).ok_or_else(|| {
            LlmError::Configuration(format!(
                "Unknown LLM provider '{}' (expected groq, openai or anthropic)",
                settings.provider
            ))
        })?;

        let key = match provider {
            LlmProvider::Groq => &settings.groq_api_key,
            LlmProvider::OpenAI => &settings.openai_api_key,
            LlmProvider::Anthropic => &settings.anthropic_api_key,
        };

        let mut config = Self::new(provider)
            .with_max_tokens(settings.max_tokens)
            .with_temperature(settings.temperature)
            .with_timeout(Duration::from_secs(settings.timeout_seconds));
        if let Some(model) = settings.model.as_deref().filter(|m| !m.trim().is_empty()) {
            config = config.with_model(model);
        }
        if let Some(endpoint) = &settings.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if !key.trim().is_empty() {
            config.api_key = Some(key.trim().to_string());
        }
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
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

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn require_key(&self) -> Result<String, LlmError> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                LlmError::Configuration(format!(
                    "{} requires {}",
                    self.provider,
                    self.provider.key_variable()
                ))
            })
    }
}

/// Factory for creating LLM backends
pub struct LlmFactory;

impl LlmFactory {
    pub fn create_backend(config: &LlmProviderConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
        let api_key = config.require_key()?;

        tracing::info!(
            provider = %config.provider,
            model = %config.model,
            "Creating LLM backend"
        );

        match config.provider {
            LlmProvider::Groq | LlmProvider::OpenAI => {
                let mut openai_config = if config.provider == LlmProvider::Groq {
                    OpenAIConfig::groq(api_key, &config.model)
                } else {
                    OpenAIConfig::openai(api_key, &config.model)
                };
                if let Some(endpoint) = &config.endpoint {
                    openai_config = openai_config.with_endpoint(endpoint.clone());
                }
                let openai_config = openai_config
                    .with_max_tokens(config.max_tokens)
                    .with_temperature(config.temperature)
                    .with_timeout(config.timeout);
                Ok(Arc::new(OpenAIBackend::new(openai_config)?))
            }

            LlmProvider::Anthropic => {
                let mut claude_config = ClaudeConfig::new(api_key)
                    .with_model(&config.model)
                    .with_max_tokens(config.max_tokens)
                    .with_temperature(config.temperature)
                    .with_timeout(config.timeout);
                if let Some(endpoint) = &config.endpoint {
                    claude_config = claude_config.with_endpoint(endpoint.clone());
                }
                Ok(Arc::new(ClaudeBackend::new(claude_config)?))
            }
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Arc<dyn LlmBackend>, LlmError> {
        Self::create_backend(&LlmProviderConfig::from_settings(settings)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> LlmSettings {
        LlmSettings {
            provider: provider.to_string(),
            groq_api_key: String::new(),
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            ..LlmSettings::default()
        }
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(LlmProvider::from_str("Groq"), Some(LlmProvider::Groq));
        assert_eq!(LlmProvider::from_str("claude"), Some(LlmProvider::Anthropic));
        assert_eq!(LlmProvider::from_str("anthropic"), Some(LlmProvider::Anthropic));
        assert_eq!(LlmProvider::from_str("openai"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::from_str("ollama"), None);
    }

    #[test]
    fn test_unknown_provider_fails_fast() {
        let err = LlmProviderConfig::from_settings(&settings("mistral")).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("mistral"));
    }

    #[test]
    fn test_missing_key_fails_fast() {
        let config = LlmProviderConfig::from_settings(&settings("groq")).unwrap();
        assert!(!config.has_api_key());
        let err = LlmFactory::create_backend(&config).err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_settings_pick_provider_key_and_model() {
        let mut s = settings("anthropic");
        s.anthropic_api_key = "sk-ant".to_string();
        s.groq_api_key = "gsk".to_string();
        let config = LlmProviderConfig::from_settings(&s).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-ant"));
        assert_eq!(config.model, "claude-sonnet-4-20250514");

        s.model = Some("claude-3-5-haiku-20241022".to_string());
        let backend = LlmFactory::from_settings(&s).unwrap();
        assert_eq!(backend.model_name(), "claude-3-5-haiku-20241022");
    }

    #[test]
    fn test_groq_backend_from_settings() {
        let mut s = settings("groq");
        s.groq_api_key = "gsk".to_string();
        let backend = LlmFactory::from_settings(&s).unwrap();
        assert_eq!(backend.model_name(), "llama-3.3-70b-versatile");
    }
}
