//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;
use std::time::Duration;

use domain_pack_config::{Settings, ValidationPipeline};
use domain_pack_core::Clock;
use domain_pack_intent::{IntentInterpreter, InterpreterConfig};
use domain_pack_llm::{LlmBackend, LlmError, LlmFactory};
use domain_pack_persistence::{DocumentBuilder, DocumentStore, InMemoryDocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub pipeline: Arc<ValidationPipeline>,
    pub builder: Arc<DocumentBuilder>,
    pub store: Arc<dyn DocumentStore>,
    /// Resolved once at startup; a configuration failure is kept so every
    /// intent request can report it without calling a provider
    interpreter: Result<Arc<IntentInterpreter>, Arc<LlmError>>,
}

impl AppState {
    /// State with an in-memory store, the system clock and the configured
    /// provider
    pub fn new(config: Settings) -> Self {
        let interpreter = LlmFactory::from_settings(&config.llm)
            .map(|backend| Arc::new(Self::interpreter_for(&config, backend)))
            .map_err(|e| {
                tracing::warn!(error = %e, "Language model not configured; /intent will reject");
                Arc::new(e)
            });
        Self {
            pipeline: Arc::new(ValidationPipeline::new(config.validation.options())),
            builder: Arc::new(DocumentBuilder::default()),
            store: Arc::new(InMemoryDocumentStore::new()),
            interpreter,
            config: Arc::new(config),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.builder = Arc::new(DocumentBuilder::new(clock));
        self
    }

    /// Replace the configured provider
    pub fn with_backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.interpreter = Ok(Arc::new(Self::interpreter_for(&self.config, backend)));
        self
    }

    pub fn interpreter(&self) -> Result<&IntentInterpreter, &LlmError> {
        match &self.interpreter {
            Ok(interpreter) => Ok(interpreter.as_ref()),
            Err(err) => Err(err.as_ref()),
        }
    }

    fn interpreter_for(config: &Settings, backend: Arc<dyn LlmBackend>) -> IntentInterpreter {
        let budget = interpretation_budget(config.server.timeout_seconds);
        IntentInterpreter::new(
            backend,
            InterpreterConfig::from_settings(&config.intent, &config.llm).with_total_budget(budget),
        )
    }
}

/// Share of the request timeout the interpreter may spend; the rest is left
/// for the handler to answer before the timeout layer does
pub fn interpretation_budget(request_timeout_seconds: u64) -> Duration {
    let request = Duration::from_secs(request_timeout_seconds);
    request.saturating_sub(request / 10)
}
