//! Business sections: `business_context`, `business_patterns`, `business_rules`

use domain_pack_core::FieldPath;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::reader::{read_seq, read_str, read_str_list, Issues, Record};

/// Classification vocabularies for the domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_levels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_frameworks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidentiality_levels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency_levels: Option<Vec<String>>,
}

impl BusinessContext {
    pub const FIELDS: &'static [&'static str] = &[
        "risk_levels",
        "compliance_frameworks",
        "confidentiality_levels",
        "urgency_levels",
    ];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let context = Self {
            risk_levels: record.optional("risk_levels", read_str_list),
            compliance_frameworks: record.optional("compliance_frameworks", read_str_list),
            confidentiality_levels: record.optional("confidentiality_levels", read_str_list),
            urgency_levels: record.optional("urgency_levels", read_str_list),
        };
        record.finish().then_some(context)
    }
}

/// Recurring business process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessPattern {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities_involved: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_points: Option<Vec<String>>,
}

impl BusinessPattern {
    pub const FIELDS: &'static [&'static str] = &[
        "name",
        "description",
        "stages",
        "triggers",
        "entities_involved",
        "tags",
        "decision_points",
    ];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let name = record.required("name", read_str);
        let description = record.required("description", read_str);
        let stages = record.optional("stages", read_str_list);
        let triggers = record.optional("triggers", read_str_list);
        let entities_involved = record.optional("entities_involved", read_str_list);
        let tags = record.optional("tags", read_str_list);
        let decision_points = record.optional("decision_points", read_str_list);
        if !record.finish() {
            return None;
        }
        Some(Self {
            name: name?,
            description: description?,
            stages,
            triggers,
            entities_involved,
            tags,
            decision_points,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRule {
    pub name: String,
    pub description: String,
    pub rules: Vec<String>,
}

impl BusinessRule {
    pub const FIELDS: &'static [&'static str] = &["name", "description", "rules"];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let name = record.required("name", read_str);
        let description = record.required("description", read_str);
        let rules = record.required("rules", read_str_list);
        if !record.finish() {
            return None;
        }
        Some(Self {
            name: name?,
            description: description?,
            rules: rules?,
        })
    }
}

pub fn validate_business_context(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<BusinessContext> {
    BusinessContext::read(value, path, errors)
}

pub fn validate_business_patterns(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Vec<BusinessPattern>> {
    read_seq(value, path, errors, BusinessPattern::read)
}

pub fn validate_business_rules(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Vec<BusinessRule>> {
    read_seq(value, path, errors, BusinessRule::read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_pack_core::ViolationCode;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_business_context_strict() {
        let mut errors = Vec::new();
        let path = FieldPath::field("business_context");
        let context = validate_business_context(
            &yaml("risk_levels: [low, high]\nurgency_levels: [routine]\n"),
            &path,
            &mut errors,
        )
        .unwrap();
        assert_eq!(context.risk_levels.as_ref().map(Vec::len), Some(2));
        assert!(context.compliance_frameworks.is_none());

        assert!(validate_business_context(&yaml("risk_level: [low]\n"), &path, &mut errors).is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "business_context.risk_level");
    }

    #[test]
    fn test_pattern_requires_description() {
        let mut errors = Vec::new();
        let path = FieldPath::field("business_patterns");
        assert!(validate_business_patterns(
            &yaml("- name: Contract review\n  stages: [draft, review]\n"),
            &path,
            &mut errors
        )
        .is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ViolationCode::MissingField);
        assert_eq!(errors[0].path.to_string(), "business_patterns.0.description");
    }

    #[test]
    fn test_business_rules() {
        let mut errors = Vec::new();
        let rules = validate_business_rules(
            &yaml("- name: Signature\n  description: Contracts need signatures\n  rules: [both parties sign]\n"),
            &FieldPath::field("business_rules"),
            &mut errors,
        )
        .unwrap();
        assert_eq!(rules[0].rules, vec!["both parties sign"]);
    }
}
