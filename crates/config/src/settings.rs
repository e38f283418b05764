//! Main settings module

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::domain::ValidationOptions;
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Document store (ScyllaDB or in-memory)
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Language-model provider
    #[serde(default)]
    pub llm: LlmSettings,

    /// Intent interpretation
    #[serde(default)]
    pub intent: IntentSettings,

    #[serde(default)]
    pub validation: ValidationSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_persistence()?;
        self.validate_llm()?;
        self.validate_intent()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if server.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_upload_bytes".to_string(),
                message: "Upload limit must be positive".to_string(),
            });
        }

        Ok(())
    }

    fn validate_persistence(&self) -> Result<(), ConfigError> {
        let persistence = &self.persistence;
        if !persistence.enabled {
            return Ok(());
        }

        if persistence.scylla_hosts.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence.scylla_hosts".to_string(),
                message: "At least one host is required when persistence is enabled".to_string(),
            });
        }

        if persistence.replication_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "persistence.replication_factor".to_string(),
                message: "Replication factor must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", llm.temperature),
            });
        }

        if llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                message: "Must generate at least 1 token".to_string(),
            });
        }

        if llm.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    fn validate_intent(&self) -> Result<(), ConfigError> {
        if self.intent.max_repair_rounds > 5 {
            return Err(ConfigError::InvalidValue {
                field: "intent.max_repair_rounds".to_string(),
                message: format!(
                    "At most 5 repair rounds are allowed, got {}",
                    self.intent.max_repair_rounds
                ),
            });
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Largest accepted upload body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout() -> u64 {
    120
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Persistence configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory only)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "domain_packs".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Language-model provider settings
///
/// API keys default to the provider's conventional environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// One of `groq`, `openai`, `anthropic`
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name; the provider's default model when unset
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Deadline for one model call
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,

    /// Base URL override (proxies, tests)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_groq_key", skip_serializing)]
    pub groq_api_key: String,

    #[serde(default = "default_openai_key", skip_serializing)]
    pub openai_api_key: String,

    #[serde(default = "default_anthropic_key", skip_serializing)]
    pub anthropic_api_key: String,
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> usize {
    2000
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_groq_key() -> String {
    std::env::var("GROQ_API_KEY").unwrap_or_default()
}

fn default_openai_key() -> String {
    std::env::var("OPENAI_API_KEY").unwrap_or_default()
}

fn default_anthropic_key() -> String {
    std::env::var("ANTHROPIC_API_KEY").unwrap_or_default()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_llm_timeout(),
            endpoint: None,
            groq_api_key: default_groq_key(),
            openai_api_key: default_openai_key(),
            anthropic_api_key: default_anthropic_key(),
        }
    }
}

/// Intent interpretation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentSettings {
    /// Re-prompts allowed after malformed or invalid model output
    #[serde(default = "default_max_repair_rounds")]
    pub max_repair_rounds: u32,
}

fn default_max_repair_rounds() -> u32 {
    2
}

impl Default for IntentSettings {
    fn default() -> Self {
        Self {
            max_repair_rounds: default_max_repair_rounds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default = "default_true")]
    pub include_warnings: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            include_warnings: true,
        }
    }
}

impl ValidationSettings {
    pub fn options(&self) -> ValidationOptions {
        ValidationOptions::default().with_warnings(self.include_warnings)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority: env vars (`DOMAIN_PACK__*`) > config/{env} > config/default > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// [`load_settings`] with an explicit configuration directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("DOMAIN_PACK")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
