//! Intent interpretation
//!
//! Turns a free-text change request into a verified [`Intent`] for a
//! downstream applier:
//! - `types`: intent, operation and context types
//! - `schema`: the intent contract, reusing the section schemas for payloads
//! - `collision`: conflicts with the current document
//! - `prompt`: deterministic prompt rendering
//! - `extract`: JSON recovery and normalisation of model output
//! - `interpreter`: the bounded-repair state machine around the model call

pub mod collision;
pub mod extract;
pub mod interpreter;
pub mod prompt;
pub mod schema;
pub mod types;

pub use collision::check_collisions;
pub use extract::{extract_json, normalize};
pub use interpreter::{
    IntentInterpreter, InterpretationState, InterpretationStatus, InterpretationVerdict,
    InterpreterConfig,
};
pub use prompt::{render, structural_summary, RepairFeedback};
pub use schema::IntentSchema;
pub use types::{
    EntityRef, ExecutionRisk, Intent, IntentConstraints, IntentContext, IntentTarget,
    MetadataField, Operation, ValidationRequirements,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntentError {
    #[error("user_request must not be empty")]
    EmptyRequest,
}
