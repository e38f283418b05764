//! Intent interpretation state machine
//!
//! ```text
//! BUILDING_PROMPT → AWAITING_MODEL → PARSING_RESPONSE → VALIDATING_INTENT → ACCEPTED
//!                        ↑                  │                  │
//!                        └──── REPAIRING ←──┴──────────────────┘
//!                                  │
//!                                  └→ REJECTED (LLM_OUTPUT_INVALID)
//! ```
//!
//! Provider failures and deadline expiry in `AWAITING_MODEL` go straight to
//! `REJECTED` with `LLM_API_ERROR`. With a total budget set, each call's
//! deadline is cut to what is left of it. Only malformed or invalid output is
//! repaired. The model call is the only await point; dropping the returned
//! future drops the in-flight request with it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use domain_pack_config::{IntentSettings, LlmSettings};
use domain_pack_core::{ErrorKind, FieldPath, ValidationIssue, ViolationCode};
use domain_pack_llm::{LlmBackend, LlmError, Message};
use serde::{Deserialize, Serialize};

use crate::collision::check_collisions;
use crate::extract::{extract_json, normalize};
use crate::prompt::{render, RepairFeedback};
use crate::schema::IntentSchema;
use crate::types::{Intent, IntentContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterpretationState {
    BuildingPrompt,
    AwaitingModel,
    ParsingResponse,
    ValidatingIntent,
    Repairing,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterpretationStatus {
    Accepted,
    Rejected,
}

/// Outcome of one interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationVerdict {
    pub status: InterpretationStatus,
    pub intent: Option<Intent>,
    /// Rejection kind; `None` when accepted
    pub kind: Option<ErrorKind>,
    pub errors: Vec<ValidationIssue>,
    /// States visited, in order
    pub trail: Vec<InterpretationState>,
    /// Model calls made
    pub attempts: u32,
    pub model_latency_ms: u64,
}

impl InterpretationVerdict {
    pub fn is_accepted(&self) -> bool {
        self.status == InterpretationStatus::Accepted
    }

    /// Rejection raised before the state machine could start, e.g. when no
    /// backend could be resolved
    pub fn configuration_error(err: &LlmError) -> Self {
        Self {
            status: InterpretationStatus::Rejected,
            intent: None,
            kind: Some(ErrorKind::LlmConfigurationError),
            errors: vec![provider_issue(ErrorKind::LlmConfigurationError, err.to_string())],
            trail: vec![InterpretationState::Rejected],
            attempts: 0,
            model_latency_ms: 0,
        }
    }

    /// Human-readable one-liner
    pub fn message(&self) -> String {
        match (&self.intent, self.kind) {
            (Some(intent), _) => format!(
                "Interpreted {} on {} after {} model call(s)",
                intent.operation, intent.target_section, self.attempts
            ),
            (None, Some(ErrorKind::LlmOutputInvalid)) => format!(
                "Model output stayed invalid after {} attempt(s)",
                self.attempts
            ),
            (None, Some(kind)) => match self.errors.first() {
                Some(error) => format!("{}: {}", kind, error.message),
                None => kind.to_string(),
            },
            (None, None) => "Interpretation rejected".to_string(),
        }
    }
}

fn provider_issue(kind: ErrorKind, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue::new(kind, ViolationCode::ProviderFailure, FieldPath::root(), message)
}

#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Re-prompts allowed after malformed or invalid output
    pub max_repair_rounds: u32,
    /// Deadline for one model call
    pub model_timeout: Duration,
    /// Deadline for the whole interpretation, repairs included
    pub total_budget: Option<Duration>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_repair_rounds: 2,
            model_timeout: Duration::from_secs(30),
            total_budget: None,
        }
    }
}

impl InterpreterConfig {
    pub fn from_settings(intent: &IntentSettings, llm: &LlmSettings) -> Self {
        Self {
            max_repair_rounds: intent.max_repair_rounds,
            model_timeout: Duration::from_secs(llm.timeout_seconds),
            total_budget: None,
        }
    }

    pub fn with_max_repair_rounds(mut self, rounds: u32) -> Self {
        self.max_repair_rounds = rounds;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_total_budget(mut self, budget: Duration) -> Self {
        self.total_budget = Some(budget);
        self
    }
}

/// Next state and the data it needs
enum Step {
    BuildPrompt,
    AwaitModel(Vec<Message>),
    ParseResponse(String),
    ValidateIntent { raw: String, value: serde_json::Value },
    Repair(RepairFeedback),
    Accept(Intent),
    Reject(ErrorKind, Vec<ValidationIssue>),
}

impl Step {
    fn state(&self) -> InterpretationState {
        match self {
            Step::BuildPrompt => InterpretationState::BuildingPrompt,
            Step::AwaitModel(_) => InterpretationState::AwaitingModel,
            Step::ParseResponse(_) => InterpretationState::ParsingResponse,
            Step::ValidateIntent { .. } => InterpretationState::ValidatingIntent,
            Step::Repair(_) => InterpretationState::Repairing,
            Step::Accept(_) => InterpretationState::Accepted,
            Step::Reject(..) => InterpretationState::Rejected,
        }
    }
}

/// Per-call bookkeeping, discarded when the call ends
#[derive(Default)]
struct Run {
    trail: Vec<InterpretationState>,
    attempts: u32,
    repairs: u32,
    latency_ms: u64,
    deadline: Option<Instant>,
}

pub struct IntentInterpreter {
    backend: Arc<dyn LlmBackend>,
    config: InterpreterConfig,
}

impl IntentInterpreter {
    pub fn new(backend: Arc<dyn LlmBackend>, config: InterpreterConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    pub async fn interpret(&self, context: &IntentContext) -> InterpretationVerdict {
        let mut run = Run {
            deadline: self.config.total_budget.map(|budget| Instant::now() + budget),
            ..Run::default()
        };
        let mut step = Step::BuildPrompt;

        loop {
            run.trail.push(step.state());
            step = match step {
                Step::BuildPrompt => Step::AwaitModel(render(context, None)),
                Step::AwaitModel(messages) => self.await_model(&messages, &mut run).await,
                Step::ParseResponse(raw) => match extract_json(&raw) {
                    Ok(value) => Step::ValidateIntent { raw, value },
                    Err(message) => Step::Repair(RepairFeedback {
                        previous_output: raw,
                        errors: vec![ValidationIssue::new(
                            ErrorKind::IntentSchemaError,
                            ViolationCode::Malformed,
                            FieldPath::root(),
                            message,
                        )],
                    }),
                },
                Step::ValidateIntent { raw, value } => self.validate(raw, value, context),
                Step::Repair(feedback) => {
                    if run.repairs >= self.config.max_repair_rounds {
                        Step::Reject(ErrorKind::LlmOutputInvalid, feedback.errors)
                    } else {
                        run.repairs += 1;
                        tracing::info!(
                            domain_pack_id = %context.domain_pack_id,
                            round = run.repairs,
                            errors = feedback.errors.len(),
                            "Repairing model output"
                        );
                        Step::AwaitModel(render(context, Some(&feedback)))
                    }
                }
                Step::Accept(intent) => return self.finish(run, Some(intent), None, Vec::new()),
                Step::Reject(kind, errors) => return self.finish(run, None, Some(kind), errors),
            };
        }
    }

    async fn await_model(&self, messages: &[Message], run: &mut Run) -> Step {
        let remaining = run
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        if remaining == Some(Duration::ZERO) {
            return self.budget_exhausted(run);
        }
        let limit = remaining.map_or(self.config.model_timeout, |left| {
            left.min(self.config.model_timeout)
        });

        run.attempts += 1;
        let start = Instant::now();
        let outcome = tokio::time::timeout(limit, self.backend.generate(messages)).await;
        run.latency_ms += start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(result)) => {
                tracing::debug!(
                    attempt = run.attempts,
                    tokens = result.tokens,
                    "Model responded"
                );
                Step::ParseResponse(result.text)
            }
            Ok(Err(err)) => {
                let kind = if err.is_configuration() {
                    ErrorKind::LlmConfigurationError
                } else {
                    ErrorKind::LlmApiError
                };
                tracing::warn!(error = %err, attempt = run.attempts, "Model call failed");
                Step::Reject(kind, vec![provider_issue(kind, err.to_string())])
            }
            Err(_) if limit < self.config.model_timeout => self.budget_exhausted(run),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.model_timeout.as_millis() as u64,
                    "Model call exceeded deadline"
                );
                Step::Reject(
                    ErrorKind::LlmApiError,
                    vec![provider_issue(
                        ErrorKind::LlmApiError,
                        format!(
                            "model call exceeded the {}ms deadline",
                            self.config.model_timeout.as_millis()
                        ),
                    )],
                )
            }
        }
    }

    fn budget_exhausted(&self, run: &Run) -> Step {
        let budget_ms = self.config.total_budget.unwrap_or_default().as_millis();
        tracing::warn!(
            budget_ms = budget_ms as u64,
            attempts = run.attempts,
            "Interpretation exceeded its total budget"
        );
        Step::Reject(
            ErrorKind::LlmApiError,
            vec![provider_issue(
                ErrorKind::LlmApiError,
                format!(
                    "interpretation exceeded its {}ms budget after {} model call(s)",
                    budget_ms, run.attempts
                ),
            )],
        )
    }

    fn validate(&self, raw: String, value: serde_json::Value, context: &IntentContext) -> Step {
        let normalized = normalize(value, context);
        let errors = match IntentSchema::check(&normalized) {
            Ok(intent) => {
                let collisions = context
                    .current_document
                    .as_ref()
                    .map(|document| check_collisions(&intent, document))
                    .unwrap_or_default();
                if collisions.is_empty() {
                    return Step::Accept(intent);
                }
                collisions
            }
            Err(errors) => errors,
        };
        Step::Repair(RepairFeedback {
            previous_output: raw,
            errors,
        })
    }

    fn finish(
        &self,
        run: Run,
        intent: Option<Intent>,
        kind: Option<ErrorKind>,
        errors: Vec<ValidationIssue>,
    ) -> InterpretationVerdict {
        let status = if intent.is_some() {
            InterpretationStatus::Accepted
        } else {
            InterpretationStatus::Rejected
        };
        tracing::info!(
            status = ?status,
            kind = ?kind,
            attempts = run.attempts,
            model_latency_ms = run.latency_ms,
            "Interpretation finished"
        );
        InterpretationVerdict {
            status,
            intent,
            kind,
            errors,
            trail: run.trail,
            attempts: run.attempts,
            model_latency_ms: run.latency_ms,
        }
    }
}
