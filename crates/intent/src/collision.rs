//! Collision rules against the current document
//!
//! A well-formed intent can still conflict with the pack it edits. These
//! findings are `SEMANTIC_COLLISION`, distinct from schema errors.

use domain_pack_config::domain::is_keyed;
use domain_pack_config::DomainConfigDocument;
use domain_pack_core::{ErrorKind, FieldPath, SectionName, ValidationIssue, ViolationCode};
use serde_json::Value;

use crate::types::{Intent, IntentTarget, Operation};

fn collision(code: ViolationCode, path: FieldPath, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue::new(ErrorKind::SemanticCollision, code, path, message)
}

pub fn check_collisions(intent: &Intent, document: &DomainConfigDocument) -> Vec<ValidationIssue> {
    let mut found = Vec::new();
    let IntentTarget::Section(section) = intent.target_section else {
        return found;
    };

    if is_keyed(section) {
        record_collisions(intent, section, document, &mut found);
    }
    if matches!(intent.operation, Operation::Add | Operation::Modify) {
        reference_collisions(intent, section, document, &mut found);
    }
    found
}

fn record_collisions(
    intent: &Intent,
    section: SectionName,
    document: &DomainConfigDocument,
    found: &mut Vec<ValidationIssue>,
) {
    let path = FieldPath::field("target_path");
    // MERGE addresses every listed record, the rest only the first
    let keys: &[String] = match intent.operation {
        Operation::Merge => &intent.target_path,
        _ => intent.target_path.get(..1).unwrap_or(&[]),
    };

    for (i, key) in keys.iter().enumerate() {
        let exists = document.has_record(section, key);
        match intent.operation {
            Operation::Add if exists => found.push(collision(
                ViolationCode::Duplicate,
                path.index(i),
                format!("'{}' already exists in {}", key, section),
            )),
            Operation::Modify | Operation::Remove | Operation::Merge | Operation::Split
                if !exists =>
            {
                found.push(collision(
                    ViolationCode::DanglingReference,
                    path.index(i),
                    format!("'{}' does not exist in {}", key, section),
                ))
            }
            _ => {}
        }
    }
}

/// Entity names carried by the payload must exist in the document
fn reference_collisions(
    intent: &Intent,
    section: SectionName,
    document: &DomainConfigDocument,
    found: &mut Vec<ValidationIssue>,
) {
    let base = FieldPath::field("payload");
    let mut check = |path: FieldPath, value: &Value| {
        if let Some(reference) = value.as_str() {
            if !document.knows_entity(reference) {
                found.push(collision(
                    ViolationCode::DanglingReference,
                    path,
                    format!("references unknown entity '{}'", reference),
                ));
            }
        }
    };

    match section {
        SectionName::Relationships => {
            for key in ["from", "to"] {
                if let Some(value) = intent.payload.get(key) {
                    check(base.key(key), value);
                }
            }
        }
        SectionName::BusinessPatterns => {
            check_list(
                base.key("entities_involved"),
                intent.payload.get("entities_involved"),
                &mut check,
            );
        }
        SectionName::RelationshipTypes => {
            let context_path = base.key("business_context");
            if let Some(Value::Object(context)) = intent.payload.get("business_context") {
                for key in ["from", "to"] {
                    if let Some(value) = context.get(key) {
                        check(context_path.key(key), value);
                    }
                }
                check_list(
                    context_path.key("entities_involved"),
                    context.get("entities_involved"),
                    &mut check,
                );
            }
        }
        _ => {}
    }
}

fn check_list(path: FieldPath, value: Option<&Value>, check: &mut dyn FnMut(FieldPath, &Value)) {
    if let Some(Value::Array(items)) = value {
        for (i, item) in items.iter().enumerate() {
            check(path.index(i), item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IntentSchema;
    use domain_pack_config::domain::ValidationPipeline;
    use serde_json::json;

    const PACK: &str = r#"
name: Legal
description: Legal domain
version: 1.0.0
entities:
  - {name: Contract, type: DOCUMENT, attributes: [parties]}
  - {name: Party, type: ORGANIZATION, attributes: [name]}
relationships:
  - {name: binds, from: Contract, to: Party, attributes: []}
"#;

    fn document() -> DomainConfigDocument {
        ValidationPipeline::default()
            .validate_document(PACK)
            .into_validated()
            .unwrap()
            .into_document()
    }

    fn intent(operation: &str, target: &str, path: Value, payload: Value) -> Intent {
        IntentSchema::check(&json!({
            "intent_id": "i-1",
            "domain_pack_id": "pack-1",
            "operation": operation,
            "target_section": target,
            "target_path": path,
            "payload": payload,
            "rationale": "test"
        }))
        .unwrap()
    }

    #[test]
    fn test_add_existing_entity_collides() {
        let add = intent(
            "ADD",
            "entities",
            json!(["Contract"]),
            json!({"name": "Contract", "type": "DOCUMENT", "attributes": []}),
        );
        let found = check_collisions(&add, &document());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, ErrorKind::SemanticCollision);
        assert_eq!(found[0].code, ViolationCode::Duplicate);
        assert_eq!(found[0].path.to_string(), "target_path.0");
    }

    #[test]
    fn test_remove_missing_entity_collides() {
        let remove = intent("REMOVE", "entities", json!(["Judge"]), json!({}));
        let found = check_collisions(&remove, &document());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, ViolationCode::DanglingReference);

        let remove = intent("REMOVE", "entities", json!(["Party"]), json!({}));
        assert!(check_collisions(&remove, &document()).is_empty());
    }

    #[test]
    fn test_merge_checks_every_record() {
        let merge = intent("MERGE", "entities", json!(["Contract", "Deed"]), json!({}));
        let found = check_collisions(&merge, &document());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.to_string(), "target_path.1");
    }

    #[test]
    fn test_add_relationship_with_unknown_entity_collides() {
        let add = intent(
            "ADD",
            "relationships",
            json!(["sues"]),
            json!({"name": "sues", "from": "Party", "to": "Court", "attributes": []}),
        );
        let found = check_collisions(&add, &document());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.to_string(), "payload.to");
        assert!(found[0].message.contains("Court"));
    }

    #[test]
    fn test_pattern_entities_resolve_by_type() {
        let add = intent(
            "ADD",
            "business_patterns",
            json!(["Review"]),
            json!({"name": "Review", "description": "d", "entities_involved": ["DOCUMENT", "Judge"]}),
        );
        let found = check_collisions(&add, &document());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.to_string(), "payload.entities_involved.1");
    }

    #[test]
    fn test_metadata_targets_never_collide() {
        let modify = intent("MODIFY", "version", json!([]), json!({"value": "2.0.0"}));
        assert!(check_collisions(&modify, &document()).is_empty());
    }
}
