//! Typed reads over untyped YAML trees
//!
//! Every reader appends violations to a shared error list and keeps going, so
//! one pass over a section reports all of its problems. A reader returns
//! `None` when the value it was asked for could not be produced.

use std::collections::BTreeMap;

use domain_pack_core::{FieldPath, ValidationIssue, ViolationCode};
use serde_yaml::{Mapping, Value};

use super::canonical::yaml_to_json;

pub type Issues = Vec<ValidationIssue>;

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Mapping keys that can be rendered as a path segment
pub(crate) fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn mismatch(path: &FieldPath, expected: &str, found: &Value) -> ValidationIssue {
    ValidationIssue::schema(
        ViolationCode::TypeMismatch,
        path.clone(),
        format!("expected {}, found {}", expected, kind_of(found)),
    )
}

pub(crate) fn unknown_field(path: &FieldPath, key: &str) -> ValidationIssue {
    ValidationIssue::schema(
        ViolationCode::UnknownField,
        path.key(key),
        format!("unknown field '{}'", key),
    )
}

/// Non-empty string
pub(crate) fn read_str(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => {
            errors.push(ValidationIssue::schema(
                ViolationCode::EmptyValue,
                path.clone(),
                "must not be empty",
            ));
            None
        }
        Value::String(s) => Some(s.clone()),
        other => {
            errors.push(mismatch(path, "string", other));
            None
        }
    }
}

/// Sequence whose every item passes `item`
pub(crate) fn read_seq<T>(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
    item: impl Fn(&Value, &FieldPath, &mut Issues) -> Option<T>,
) -> Option<Vec<T>> {
    let Some(seq) = value.as_sequence() else {
        errors.push(mismatch(path, "sequence", value));
        return None;
    };
    let mut out = Vec::with_capacity(seq.len());
    let mut ok = true;
    for (i, v) in seq.iter().enumerate() {
        match item(v, &path.index(i), errors) {
            Some(t) => out.push(t),
            None => ok = false,
        }
    }
    ok.then_some(out)
}

pub(crate) fn read_str_list(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Vec<String>> {
    read_seq(value, path, errors, read_str)
}

/// Mapping with scalar keys whose every value passes `item`
pub(crate) fn read_map<T>(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
    item: impl Fn(&Value, &FieldPath, &mut Issues) -> Option<T>,
) -> Option<BTreeMap<String, T>> {
    let Some(map) = value.as_mapping() else {
        errors.push(mismatch(path, "mapping", value));
        return None;
    };
    let mut out = BTreeMap::new();
    let mut ok = true;
    for (k, v) in map {
        let Some(key) = scalar_key(k) else {
            errors.push(mismatch(path, "scalar key", k));
            ok = false;
            continue;
        };
        match item(v, &path.key(key.clone()), errors) {
            Some(t) => {
                out.insert(key, t);
            }
            None => ok = false,
        }
    }
    ok.then_some(out)
}

/// Free-form mapping, kept as JSON
pub(crate) fn read_json_map(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<serde_json::Map<String, serde_json::Value>> {
    if value.as_mapping().is_none() {
        errors.push(mismatch(path, "mapping", value));
        return None;
    }
    match yaml_to_json(value) {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Number in `[0, 1]`
pub(crate) fn read_unit_interval(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<f64> {
    let Some(n) = value.as_f64() else {
        errors.push(mismatch(path, "number", value));
        return None;
    };
    if !(0.0..=1.0).contains(&n) {
        errors.push(ValidationIssue::schema(
            ViolationCode::OutOfRange,
            path.clone(),
            format!("must be between 0.0 and 1.0, found {}", n),
        ));
        return None;
    }
    Some(n)
}

/// Strict view over one YAML mapping
///
/// Unknown keys are reported as soon as the record is opened. `finish`
/// reports whether any read on this record failed.
pub(crate) struct Record<'v, 'e> {
    map: &'v Mapping,
    path: FieldPath,
    errors: &'e mut Issues,
    start: usize,
}

impl<'v, 'e> Record<'v, 'e> {
    pub fn open(
        value: &'v Value,
        path: &FieldPath,
        allowed: &[&str],
        errors: &'e mut Issues,
    ) -> Option<Self> {
        let Some(map) = value.as_mapping() else {
            errors.push(mismatch(path, "mapping", value));
            return None;
        };
        let start = errors.len();
        for key in map.keys() {
            match scalar_key(key) {
                Some(k) if allowed.contains(&k.as_str()) => {}
                Some(k) => errors.push(unknown_field(path, &k)),
                None => errors.push(mismatch(path, "scalar key", key)),
            }
        }
        Some(Self {
            map,
            path: path.clone(),
            errors,
            start,
        })
    }

    fn get(&self, key: &str) -> Option<&'v Value> {
        let map = self.map;
        map.get(key)
    }

    pub fn required<T>(
        &mut self,
        key: &str,
        read: impl FnOnce(&Value, &FieldPath, &mut Issues) -> Option<T>,
    ) -> Option<T> {
        let path = self.path.key(key);
        match self.get(key) {
            Some(value) => read(value, &path, &mut *self.errors),
            None => {
                self.errors.push(ValidationIssue::schema(
                    ViolationCode::MissingField,
                    path,
                    format!("missing required field '{}'", key),
                ));
                None
            }
        }
    }

    /// Absent and `null` both read as `None` without an error
    pub fn optional<T>(
        &mut self,
        key: &str,
        read: impl FnOnce(&Value, &FieldPath, &mut Issues) -> Option<T>,
    ) -> Option<T> {
        let path = self.path.key(key);
        match self.get(key) {
            Some(Value::Null) | None => None,
            Some(value) => read(value, &path, &mut *self.errors),
        }
    }

    pub fn finish(self) -> bool {
        self.errors.len() == self.start
    }
}
