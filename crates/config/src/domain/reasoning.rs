//! `reasoning_templates` section

use std::collections::BTreeMap;

use domain_pack_core::FieldPath;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::reader::{read_map, read_seq, read_str, read_str_list, read_unit_interval, Issues, Record};

/// Ordered reasoning procedure
///
/// Step keys are often written as bare integers in YAML; they are kept as
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTemplate {
    pub name: String,
    pub steps: BTreeMap<String, String>,
    pub triggers: Vec<String>,
    pub confidence_threshold: f64,
}

impl ReasoningTemplate {
    pub const FIELDS: &'static [&'static str] =
        &["name", "steps", "triggers", "confidence_threshold"];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let name = record.required("name", read_str);
        let steps = record.required("steps", |v, p, e| read_map(v, p, e, read_str));
        let triggers = record.required("triggers", read_str_list);
        let confidence_threshold = record.required("confidence_threshold", read_unit_interval);
        if !record.finish() {
            return None;
        }
        Some(Self {
            name: name?,
            steps: steps?,
            triggers: triggers?,
            confidence_threshold: confidence_threshold?,
        })
    }
}

pub fn validate_reasoning_templates(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Vec<ReasoningTemplate>> {
    read_seq(value, path, errors, ReasoningTemplate::read)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_step_keys() {
        let value: Value = serde_yaml::from_str(
            r#"
- name: Breach analysis
  steps:
    1: Identify obligation
    2: Check performance
  triggers: [breach]
  confidence_threshold: 0.7
"#,
        )
        .unwrap();
        let mut errors = Vec::new();
        let templates =
            validate_reasoning_templates(&value, &FieldPath::field("reasoning_templates"), &mut errors)
                .unwrap();
        assert!(errors.is_empty());
        assert_eq!(templates[0].steps["2"], "Check performance");
    }

    #[test]
    fn test_step_values_must_be_strings() {
        let value: Value = serde_yaml::from_str(
            "- name: x\n  steps: {1: [a]}\n  triggers: []\n  confidence_threshold: 0.5\n",
        )
        .unwrap();
        let mut errors = Vec::new();
        assert!(validate_reasoning_templates(
            &value,
            &FieldPath::field("reasoning_templates"),
            &mut errors
        )
        .is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "reasoning_templates.0.steps.1");
    }
}
