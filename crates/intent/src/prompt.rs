//! Prompt rendering
//!
//! Rendering is a pure function of the context and the repair feedback, so
//! identical inputs always produce identical messages.

use std::fmt::Write;

use domain_pack_config::domain::METADATA_FIELDS;
use domain_pack_config::DomainConfigDocument;
use domain_pack_core::{SectionName, ValidationIssue};
use domain_pack_llm::Message;

use crate::types::IntentContext;

pub const SYSTEM_PROMPT: &str = r#"You are the intent interpreter for a domain pack management system.

Convert the user's request into ONE JSON object describing a single edit to a
domain pack. Output the JSON object only: no markdown, no commentary.

Domain packs are YAML documents with these top-level fields and sections:
{targets}

Rules:
1. Choose exactly one target_section from the list above.
2. Choose exactly one operation: ADD, MODIFY, REMOVE, MERGE, SPLIT, REORDER.
3. target_path addresses the record inside the section: the record key
   (entity name, relationship name, relationship type, pattern name,
   template name, rule name, or alias key) followed by field names.
   ADD, MODIFY and REMOVE on those sections require a non-empty target_path.
4. For ADD, payload.explicit holds the complete new record with every
   required field of its section. For MODIFY it holds only changed fields.
   For key_terms the record is {"term": "..."}; for entity_aliases it is
   {"aliases": [...]}; for name, description and version it is {"value": "..."}.
5. Put details you inferred but the user did not state in payload.implicit.
6. Never invent entities. Reference only entities listed in the current
   structure or introduced by this same request.
7. When the request is underspecified, list the gaps in "ambiguities" and
   lower "confidence" (0.0 to 1.0).
8. execution_risk is LOW, MEDIUM or HIGH. Judge it conservatively.

Output format:
{
  "target_section": "entities",
  "operation": "ADD",
  "target_path": ["Judge"],
  "intent_summary": "Add a Judge entity",
  "confidence": 0.9,
  "entities_involved": [{"type": "ENTITY", "name": "Judge"}],
  "payload": {
    "explicit": {"name": "Judge", "type": "PERSON", "attributes": ["court"]},
    "implicit": {}
  },
  "assumptions": [],
  "ambiguities": [],
  "suggestions": [],
  "execution_risk": "LOW"
}"#;

/// Model output rejected in the previous round
#[derive(Debug, Clone, PartialEq)]
pub struct RepairFeedback {
    pub previous_output: String,
    pub errors: Vec<ValidationIssue>,
}

pub fn system_prompt() -> String {
    let targets: Vec<&str> = METADATA_FIELDS
        .iter()
        .copied()
        .chain(SectionName::ALL.iter().map(|s| s.as_str()))
        .collect();
    SYSTEM_PROMPT.replace("{targets}", &format!("- {}", targets.join("\n- ")))
}

/// Compact outline of the current document: present sections with their
/// record keys, and entities with their types.
pub fn structural_summary(document: &DomainConfigDocument) -> String {
    let mut out = String::new();
    let present = document.present_sections();
    if present.is_empty() {
        out.push_str("Present sections: (none)\n");
        return out;
    }

    let names: Vec<&str> = present.iter().map(|s| s.as_str()).collect();
    let _ = writeln!(out, "Present sections: {}", names.join(", "));

    let entities: Vec<String> = document
        .entities()
        .iter()
        .map(|e| format!("{} ({})", e.name, e.entity_type))
        .collect();
    if !entities.is_empty() {
        let _ = writeln!(out, "Entities: {}", entities.join(", "));
    }

    for section in present {
        if section == SectionName::Entities {
            continue;
        }
        if let Some(keys) = document.section(section).and_then(|p| p.record_keys()) {
            if !keys.is_empty() {
                let _ = writeln!(out, "Existing {}: {}", section, keys.join(", "));
            }
        }
    }
    out
}

pub fn user_message(context: &IntentContext) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Domain Pack ID: {}", context.domain_pack_id);
    let _ = writeln!(out, "Domain Name: {}", context.domain_name);
    let _ = writeln!(out, "Domain Description: {}", context.description);
    if let Some(document) = &context.current_document {
        out.push_str("\nCurrent structure:\n");
        out.push_str(&structural_summary(document));
    }
    let _ = write!(out, "\nUser Request:\n{}", context.user_request.trim());
    out
}

fn repair_message(feedback: &RepairFeedback) -> String {
    let mut out = String::from("Your previous response was rejected:\n");
    for error in &feedback.errors {
        let _ = writeln!(out, "- {}", error);
    }
    out.push_str("Return a corrected JSON object only.");
    out
}

/// Messages for one model call
pub fn render(context: &IntentContext, feedback: Option<&RepairFeedback>) -> Vec<Message> {
    let mut messages = vec![
        Message::system(system_prompt()),
        Message::user(user_message(context)),
    ];
    if let Some(feedback) = feedback {
        messages.push(Message::assistant(feedback.previous_output.clone()));
        messages.push(Message::user(repair_message(feedback)));
    }
    messages
}
