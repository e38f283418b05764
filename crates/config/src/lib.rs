//! Configuration and domain pack schemas
//!
//! Settings are loaded from:
//! - YAML/TOML files under `config/`
//! - Environment variables (`DOMAIN_PACK__` prefix)
//!
//! # Domain packs
//!
//! The [`domain`] module holds one schema per domain pack section, the
//! document schema composing them, and the [`domain::ValidationPipeline`]
//! that turns raw YAML into a verdict.

pub mod domain;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, IntentSettings, LlmSettings, ObservabilityConfig,
    PersistenceConfig, RuntimeEnvironment, ServerConfig, Settings, ValidationSettings,
};

pub use domain::{
    DocumentSchema, DomainConfigDocument, SectionPayload, ValidatedDocument, ValidationOptions,
    ValidationOutcome, ValidationPipeline,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
