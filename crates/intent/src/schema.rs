//! Intent schema
//!
//! Checks a normalised JSON value against the intent contract and returns a
//! typed [`Intent`]. Payload fields are never checked here directly: the
//! owning section schema runs on a synthetic single-item view of the payload
//! and its issue paths are re-rooted under `payload`.

use domain_pack_config::domain::{is_keyed, key_field, validate_section};
use domain_pack_core::{
    is_semver, ErrorKind, FieldPath, SectionName, ValidationIssue, ViolationCode,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::types::{
    EntityRef, ExecutionRisk, Intent, IntentConstraints, IntentTarget, MetadataField, Operation,
    ValidationRequirements,
};

pub const INTENT_FIELDS: [&str; 16] = [
    "intent_id",
    "domain_pack_id",
    "operation",
    "target_section",
    "target_path",
    "payload",
    "rationale",
    "confidence",
    "execution_risk",
    "entities_involved",
    "inferred",
    "constraints",
    "validation_requirements",
    "assumptions",
    "ambiguities",
    "suggestions",
];

type Issues = Vec<ValidationIssue>;

fn issue(code: ViolationCode, path: FieldPath, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue::new(ErrorKind::IntentSchemaError, code, path, message)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

fn mismatch(path: &FieldPath, expected: &str, found: &Value) -> ValidationIssue {
    issue(
        ViolationCode::TypeMismatch,
        path.clone(),
        format!("expected {}, found {}", expected, kind_of(found)),
    )
}

fn missing(path: FieldPath, key: &str) -> ValidationIssue {
    issue(
        ViolationCode::MissingField,
        path,
        format!("missing required field '{}'", key),
    )
}

/// `null` counts as absent
fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn required<T>(
    obj: &Map<String, Value>,
    key: &str,
    errors: &mut Issues,
    read: impl FnOnce(&Value, &FieldPath, &mut Issues) -> Option<T>,
) -> Option<T> {
    let path = FieldPath::field(key);
    match field(obj, key) {
        Some(value) => read(value, &path, errors),
        None => {
            errors.push(missing(path, key));
            None
        }
    }
}

/// `Some(default)` when absent, `None` when present but invalid
fn optional<T: Default>(
    obj: &Map<String, Value>,
    key: &str,
    errors: &mut Issues,
    read: impl FnOnce(&Value, &FieldPath, &mut Issues) -> Option<T>,
) -> Option<T> {
    match field(obj, key) {
        Some(value) => read(value, &FieldPath::field(key), errors),
        None => Some(T::default()),
    }
}

fn read_str(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => {
            errors.push(issue(ViolationCode::EmptyValue, path.clone(), "must not be empty"));
            None
        }
        Value::String(s) => Some(s.clone()),
        other => {
            errors.push(mismatch(path, "string", other));
            None
        }
    }
}

fn read_str_list(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Vec<String>> {
    let Some(items) = value.as_array() else {
        errors.push(mismatch(path, "sequence", value));
        return None;
    };
    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        match read_str(item, &path.index(i), errors) {
            Some(s) => out.push(s),
            None => ok = false,
        }
    }
    ok.then_some(out)
}

fn read_object(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        other => {
            errors.push(mismatch(path, "mapping", other));
            None
        }
    }
}

fn read_operation(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Operation> {
    let s = read_str(value, path, errors)?;
    let operation = Operation::parse(&s);
    if operation.is_none() {
        let known: Vec<&str> = Operation::ALL.iter().map(Operation::as_str).collect();
        errors.push(issue(
            ViolationCode::InvalidFormat,
            path.clone(),
            format!("unknown operation '{}' (expected one of {})", s, known.join(", ")),
        ));
    }
    operation
}

fn read_target(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<IntentTarget> {
    let s = read_str(value, path, errors)?;
    let target = IntentTarget::parse(&s);
    if target.is_none() {
        errors.push(issue(
            ViolationCode::InvalidFormat,
            path.clone(),
            format!("unknown target section '{}'", s),
        ));
    }
    target
}

fn read_confidence(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Option<f64>> {
    let Some(n) = value.as_f64() else {
        errors.push(mismatch(path, "number", value));
        return None;
    };
    if !(0.0..=1.0).contains(&n) {
        errors.push(issue(
            ViolationCode::OutOfRange,
            path.clone(),
            format!("must be between 0.0 and 1.0, found {}", n),
        ));
        return None;
    }
    Some(Some(n))
}

fn read_risk(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Option<ExecutionRisk>> {
    let s = read_str(value, path, errors)?;
    match ExecutionRisk::parse(&s) {
        Some(risk) => Some(Some(risk)),
        None => {
            errors.push(issue(
                ViolationCode::InvalidFormat,
                path.clone(),
                format!("execution_risk must be LOW, MEDIUM or HIGH, found '{}'", s),
            ));
            None
        }
    }
}

fn read_entities(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Vec<EntityRef>> {
    let Some(items) = value.as_array() else {
        errors.push(mismatch(path, "sequence", value));
        return None;
    };
    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        let item_path = path.index(i);
        let Some(obj) = item.as_object() else {
            errors.push(mismatch(&item_path, "mapping", item));
            ok = false;
            continue;
        };
        let start = errors.len();
        for key in obj.keys().filter(|k| !matches!(k.as_str(), "type" | "name")) {
            errors.push(issue(
                ViolationCode::UnknownField,
                item_path.key(key.as_str()),
                format!("unknown field '{}'", key),
            ));
        }
        let read = |key: &str, errors: &mut Issues| match field(obj, key) {
            Some(v) => read_str(v, &item_path.key(key), errors),
            None => {
                errors.push(missing(item_path.key(key), key));
                None
            }
        };
        let entity_type = read("type", errors);
        let name = read("name", errors);
        match (entity_type, name) {
            (Some(entity_type), Some(name)) if errors.len() == start => {
                out.push(EntityRef { entity_type, name })
            }
            _ => ok = false,
        }
    }
    ok.then_some(out)
}

fn read_typed<T: DeserializeOwned>(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(t) => Some(t),
        Err(e) => {
            errors.push(issue(ViolationCode::Malformed, path.clone(), e.to_string()));
            None
        }
    }
}

pub struct IntentSchema;

impl IntentSchema {
    /// Check `value`, reporting every violation as `INTENT_SCHEMA_ERROR`
    pub fn check(value: &Value) -> Result<Intent, Vec<ValidationIssue>> {
        let Some(obj) = value.as_object() else {
            return Err(vec![issue(
                ViolationCode::Malformed,
                FieldPath::root(),
                format!("intent must be a JSON object, found {}", kind_of(value)),
            )]);
        };

        let mut errors = Vec::new();
        for key in obj.keys().filter(|k| !INTENT_FIELDS.contains(&k.as_str())) {
            errors.push(issue(
                ViolationCode::UnknownField,
                FieldPath::field(key.as_str()),
                format!("unknown field '{}'", key),
            ));
        }

        let intent_id = required(obj, "intent_id", &mut errors, read_str);
        let domain_pack_id = required(obj, "domain_pack_id", &mut errors, read_str);
        let operation = required(obj, "operation", &mut errors, read_operation);
        let target = required(obj, "target_section", &mut errors, read_target);
        let rationale = required(obj, "rationale", &mut errors, read_str);
        let target_path = optional(obj, "target_path", &mut errors, read_str_list);
        let payload = optional(obj, "payload", &mut errors, read_object);
        let inferred = optional(obj, "inferred", &mut errors, read_object);
        let confidence = optional(obj, "confidence", &mut errors, read_confidence);
        let execution_risk = optional(obj, "execution_risk", &mut errors, read_risk);
        let entities_involved = optional(obj, "entities_involved", &mut errors, read_entities);
        let constraints: Option<IntentConstraints> =
            optional(obj, "constraints", &mut errors, read_typed);
        let validation_requirements: Option<ValidationRequirements> =
            optional(obj, "validation_requirements", &mut errors, read_typed);
        let assumptions = optional(obj, "assumptions", &mut errors, read_str_list);
        let ambiguities = optional(obj, "ambiguities", &mut errors, read_str_list);
        let suggestions = optional(obj, "suggestions", &mut errors, read_str_list);

        if let (Some(operation), Some(target), Some(target_path), Some(payload)) =
            (operation, target, target_path.as_ref(), payload.as_ref())
        {
            check_payload(operation, target, target_path, payload, &mut errors);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        match (
            intent_id,
            domain_pack_id,
            operation,
            target,
            rationale,
            target_path,
            payload,
        ) {
            (
                Some(intent_id),
                Some(domain_pack_id),
                Some(operation),
                Some(target_section),
                Some(rationale),
                Some(target_path),
                Some(payload),
            ) => Ok(Intent {
                intent_id,
                domain_pack_id,
                operation,
                target_section,
                target_path,
                payload,
                rationale,
                confidence: confidence.flatten(),
                execution_risk: execution_risk.flatten(),
                entities_involved: entities_involved.unwrap_or_default(),
                inferred: inferred.unwrap_or_default(),
                constraints: constraints.unwrap_or_default(),
                validation_requirements: validation_requirements.unwrap_or_default(),
                assumptions: assumptions.unwrap_or_default(),
                ambiguities: ambiguities.unwrap_or_default(),
                suggestions: suggestions.unwrap_or_default(),
            }),
            _ => Err(vec![issue(
                ViolationCode::Malformed,
                FieldPath::root(),
                "intent is incomplete",
            )]),
        }
    }
}

fn check_payload(
    operation: Operation,
    target: IntentTarget,
    target_path: &[String],
    payload: &Map<String, Value>,
    errors: &mut Issues,
) {
    match target {
        IntentTarget::Metadata(metadata) => check_metadata(operation, metadata, payload, errors),
        IntentTarget::Section(section) => {
            check_section(operation, section, target_path, payload, errors)
        }
    }
}

fn check_metadata(
    operation: Operation,
    metadata: MetadataField,
    payload: &Map<String, Value>,
    errors: &mut Issues,
) {
    if operation != Operation::Modify {
        errors.push(issue(
            ViolationCode::NotApplicable,
            FieldPath::field("operation"),
            format!(
                "metadata field '{}' only supports MODIFY, found {}",
                metadata.as_str(),
                operation
            ),
        ));
        return;
    }

    let base = FieldPath::field("payload");
    reject_extra(payload, &["value"], &base, errors);
    let path = base.key("value");
    match field(payload, "value") {
        None => errors.push(missing(path, "value")),
        Some(value) => {
            if let Some(s) = read_str(value, &path, errors) {
                if metadata == MetadataField::Version && !is_semver(&s) {
                    errors.push(issue(
                        ViolationCode::InvalidFormat,
                        path,
                        format!(
                            "must be a semantic version (MAJOR.MINOR.PATCH), found '{}'",
                            s
                        ),
                    ));
                }
            }
        }
    }
}

fn check_section(
    operation: Operation,
    section: SectionName,
    target_path: &[String],
    payload: &Map<String, Value>,
    errors: &mut Issues,
) {
    if operation.addresses_record() && is_keyed(section) && target_path.is_empty() {
        errors.push(issue(
            ViolationCode::MissingField,
            FieldPath::field("target_path"),
            format!(
                "target_path must name the '{}' record for {}",
                section, operation
            ),
        ));
    }

    if !matches!(operation, Operation::Add | Operation::Modify) {
        return;
    }

    let base = FieldPath::field("payload");
    let mut found = Vec::new();
    section_payload_issues(section, target_path, payload, &mut found);
    if operation == Operation::Modify {
        found.retain(|i| i.code != ViolationCode::MissingField);
        if payload.is_empty() {
            found.push(issue(
                ViolationCode::EmptyValue,
                base.clone(),
                "MODIFY must change at least one field",
            ));
        }
    }
    errors.extend(
        found
            .into_iter()
            .map(|i| i.with_kind(ErrorKind::IntentSchemaError)),
    );

    if operation == Operation::Add {
        if let (Some(key_field), Some(key)) = (key_field(section), target_path.first()) {
            if let Some(Value::String(name)) = payload.get(key_field) {
                if name != key {
                    errors.push(issue(
                        ViolationCode::InvalidFormat,
                        base.key(key_field),
                        format!(
                            "payload {} '{}' does not match target_path '{}'",
                            key_field, name, key
                        ),
                    ));
                }
            }
        }
    }
}

/// Run the section schema over the payload's single-item view
fn section_payload_issues(
    section: SectionName,
    target_path: &[String],
    payload: &Map<String, Value>,
    found: &mut Issues,
) {
    let base = FieldPath::field("payload");
    let section_path = FieldPath::field(section.as_str());

    match section {
        SectionName::KeyTerms => {
            reject_extra(payload, &["term"], &base, found);
            match field(payload, "term") {
                None => found.push(missing(base.key("term"), "term")),
                Some(term) => synthetic(
                    section,
                    Value::Array(vec![term.clone()]),
                    &section_path.index(0),
                    &base.key("term"),
                    found,
                ),
            }
        }
        SectionName::EntityAliases => {
            reject_extra(payload, &["aliases"], &base, found);
            let Some(key) = target_path.first() else {
                return;
            };
            match field(payload, "aliases") {
                None => found.push(missing(base.key("aliases"), "aliases")),
                Some(aliases) => {
                    let mut view = Map::new();
                    view.insert(key.clone(), aliases.clone());
                    synthetic(
                        section,
                        Value::Object(view),
                        &section_path.key(key.as_str()),
                        &base.key("aliases"),
                        found,
                    );
                }
            }
        }
        s if s.is_sequence() => synthetic(
            s,
            Value::Array(vec![Value::Object(payload.clone())]),
            &section_path.index(0),
            &base,
            found,
        ),
        s => synthetic(s, Value::Object(payload.clone()), &section_path, &base, found),
    }
}

fn synthetic(
    section: SectionName,
    view: Value,
    prefix: &FieldPath,
    replacement: &FieldPath,
    found: &mut Issues,
) {
    let yaml = match serde_yaml::to_value(&view) {
        Ok(yaml) => yaml,
        Err(e) => {
            found.push(issue(ViolationCode::Malformed, replacement.clone(), e.to_string()));
            return;
        }
    };
    let mut issues = Vec::new();
    validate_section(
        section,
        &yaml,
        &FieldPath::field(section.as_str()),
        &mut issues,
    );
    found.extend(issues.into_iter().map(|i| {
        let path = i
            .path
            .rebase(prefix, replacement)
            .unwrap_or_else(|| replacement.clone());
        ValidationIssue { path, ..i }
    }));
}

fn reject_extra(payload: &Map<String, Value>, allowed: &[&str], base: &FieldPath, found: &mut Issues) {
    for key in payload.keys().filter(|k| !allowed.contains(&k.as_str())) {
        found.push(issue(
            ViolationCode::UnknownField,
            base.key(key.as_str()),
            format!("unknown field '{}'", key),
        ));
    }
}
