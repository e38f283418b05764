//! End-to-end checks of the validation pipeline against a complete domain pack.

use domain_pack_config::domain::{ValidationOptions, ValidationPipeline};
use domain_pack_core::{ErrorKind, SectionName, ViolationCode};
use serde_yaml::Value;

const LEGAL_PACK: &str = r#"
name: Legal
description: Legal domain
version: 3.0.0
entities:
  - name: Contract
    type: DOCUMENT
    attributes: [parties, effective_date]
    synonyms: [agreement]
  - name: Party
    type: ORGANIZATION
    attributes: [name]
key_terms: [indemnity, breach]
entity_aliases:
  Contract: [agreement, deal]
extraction_patterns:
  - pattern: 'effective (\d{4})'
    entity_type: Contract
    attribute: effective_date
    confidence: 0.8
business_context:
  risk_levels: [low, high]
  compliance_frameworks: [GDPR]
relationship_types:
  - type: BINDS
    business_context:
      from: Contract
      to: Party
relationships:
  - name: binds
    from: Contract
    to: Party
    attributes: [signed_on]
    synonyms: [obligates]
business_patterns:
  - name: Contract review
    description: Review before signature
    stages: [draft, review]
    entities_involved: [Contract, Party]
reasoning_templates:
  - name: Breach analysis
    steps:
      1: Identify obligation
      2: Check performance
    triggers: [breach]
    confidence_threshold: 0.7
multihop_questions:
  - template: "Which party breached {contract}?"
    examples: ["Which party breached the NDA?"]
    priority: high
    reasoning_type: causal
question_templates:
  entity_extraction:
    - template: "Who signed {contract}?"
      priority: high
      expected_answer_type: list
business_rules:
  - name: Signatures
    description: Contracts need signatures
    rules: [both parties sign]
validation_rules:
  required_fields:
    Contract: [parties]
"#;

enum Step {
    Key(&'static str),
    Index(usize),
}

use Step::{Index, Key};

fn pack() -> Value {
    serde_yaml::from_str(LEGAL_PACK).unwrap()
}

fn node<'a>(root: &'a mut Value, steps: &[Step]) -> &'a mut serde_yaml::Mapping {
    let mut current = root;
    for step in steps {
        current = match step {
            Key(k) => &mut current[*k],
            Index(i) => &mut current[*i],
        };
    }
    current.as_mapping_mut().unwrap()
}

fn render(steps: &[Step], leaf: &str) -> String {
    let mut parts: Vec<String> = steps
        .iter()
        .map(|s| match s {
            Key(k) => k.to_string(),
            Index(i) => i.to_string(),
        })
        .collect();
    parts.push(leaf.to_string());
    parts.join(".")
}

fn validate(value: &Value) -> domain_pack_core::ValidationVerdict {
    let raw = serde_yaml::to_string(value).unwrap();
    ValidationPipeline::new(ValidationOptions::default()).validate(&raw)
}

/// (record location, required fields that no other record depends on)
fn required_fields() -> Vec<(Vec<Step>, Vec<&'static str>)> {
    vec![
        (vec![], vec!["name", "description", "version"]),
        (vec![Key("entities"), Index(0)], vec!["type", "attributes"]),
        (
            vec![Key("extraction_patterns"), Index(0)],
            vec!["pattern", "entity_type", "attribute", "confidence"],
        ),
        (vec![Key("relationship_types"), Index(0)], vec!["type", "business_context"]),
        (vec![Key("relationships"), Index(0)], vec!["name", "from", "to", "attributes"]),
        (vec![Key("business_patterns"), Index(0)], vec!["name", "description"]),
        (
            vec![Key("reasoning_templates"), Index(0)],
            vec!["name", "steps", "triggers", "confidence_threshold"],
        ),
        (
            vec![Key("multihop_questions"), Index(0)],
            vec!["template", "priority", "reasoning_type"],
        ),
        (
            vec![Key("question_templates"), Key("entity_extraction"), Index(0)],
            vec!["template", "priority", "expected_answer_type"],
        ),
        (vec![Key("business_rules"), Index(0)], vec!["name", "description", "rules"]),
    ]
}

#[test]
fn test_complete_pack_is_valid() {
    let verdict = validate(&pack());
    assert!(verdict.is_valid, "{:?}", verdict.errors);
    assert!(verdict.errors.is_empty());
    assert!(verdict.warnings.is_empty(), "{:?}", verdict.warnings);
}

#[test]
fn test_minimal_pack_example() {
    let pipeline = ValidationPipeline::default();
    let verdict = pipeline.validate("{name: Legal, description: Legal domain, version: 3.0.0}");
    let json = serde_json::to_value(&verdict).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"is_valid": true, "errors": [], "warnings": []})
    );
}

#[test]
fn test_validate_is_deterministic() {
    let pipeline = ValidationPipeline::default();
    let broken = LEGAL_PACK.replace("to: Party\n    attributes", "to: Court\n    attributes");
    for raw in [LEGAL_PACK, broken.as_str(), "name: [", ""] {
        assert_eq!(pipeline.validate(raw), pipeline.validate(raw));
    }
}

#[test]
fn test_removing_required_field_adds_one_error() {
    for (steps, fields) in required_fields() {
        for field in fields {
            let mut value = pack();
            node(&mut value, &steps).remove(field).unwrap();
            let verdict = validate(&value);
            let expected = render(&steps, field);
            assert_eq!(verdict.errors.len(), 1, "{}: {:?}", expected, verdict.errors);
            assert_eq!(verdict.errors[0].path.to_string(), expected);
            assert_eq!(verdict.errors[0].code, ViolationCode::MissingField);
            assert_eq!(verdict.errors[0].kind, ErrorKind::SchemaValidationError);
        }
    }
}

#[test]
fn test_unknown_field_adds_one_error() {
    let mut locations: Vec<Vec<Step>> = required_fields().into_iter().map(|(s, _)| s).collect();
    locations.push(vec![Key("business_context")]);
    locations.push(vec![Key("question_templates")]);
    locations.push(vec![Key("validation_rules")]);

    for steps in locations {
        let mut value = pack();
        node(&mut value, &steps).insert(Value::from("bogus"), Value::Bool(true));
        let verdict = validate(&value);
        let expected = render(&steps, "bogus");
        assert_eq!(verdict.errors.len(), 1, "{}: {:?}", expected, verdict.errors);
        assert_eq!(verdict.errors[0].path.to_string(), expected);
        assert_eq!(verdict.errors[0].code, ViolationCode::UnknownField);
    }
}

#[test]
fn test_dangling_relationship_with_valid_sections() {
    let mut value = pack();
    node(&mut value, &[Key("relationships"), Index(0)])
        .insert(Value::from("to"), Value::from("Court"));
    let verdict = validate(&value);
    assert!(!verdict.is_valid);
    assert_eq!(verdict.errors.len(), 1);
    assert_eq!(verdict.errors[0].kind, ErrorKind::CrossReferenceError);
    assert_eq!(verdict.errors[0].path.to_string(), "relationships.0.to");
    assert!(verdict.errors[0].message.contains("Court"));
}

#[test]
fn test_schema_and_reference_errors_reported_together() {
    let mut value = pack();
    let rel = node(&mut value, &[Key("relationships"), Index(0)]);
    rel.insert(Value::from("to"), Value::from("Court"));
    rel.remove("attributes");
    let verdict = validate(&value);
    let kinds: Vec<ErrorKind> = verdict.errors.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![ErrorKind::SchemaValidationError, ErrorKind::CrossReferenceError]
    );
}

#[test]
fn test_every_section_is_counted() {
    let outcome = ValidationPipeline::default().validate_document(LEGAL_PACK);
    let validated = outcome.into_validated().unwrap();
    assert_eq!(validated.document().sections_count(), SectionName::ALL.len());
    assert_eq!(validated.section_trees().len(), SectionName::ALL.len());
}
