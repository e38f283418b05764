//! Section payloads
//!
//! One variant per section. `validate_section` is the single entry point that
//! turns an untyped subtree into the matching variant.

use std::collections::BTreeMap;

use domain_pack_core::{FieldPath, SectionName};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::business::{
    validate_business_context, validate_business_patterns, validate_business_rules,
    BusinessContext, BusinessPattern, BusinessRule,
};
use super::entities::{validate_entities, validate_entity_aliases, validate_key_terms, Entity};
use super::extraction_patterns::{validate_extraction_patterns, ExtractionPattern};
use super::questions::{
    validate_multihop_questions, validate_question_templates, MultihopQuestion, QuestionTemplates,
};
use super::reader::Issues;
use super::reasoning::{validate_reasoning_templates, ReasoningTemplate};
use super::relationships::{
    validate_relationship_types, validate_relationships, Relationship, RelationshipType,
};
use super::validation_rules::{validate_validation_rules, ValidationRules};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "payload", rename_all = "snake_case")]
pub enum SectionPayload {
    Entities(Vec<Entity>),
    KeyTerms(Vec<String>),
    EntityAliases(BTreeMap<String, Vec<String>>),
    ExtractionPatterns(Vec<ExtractionPattern>),
    BusinessContext(BusinessContext),
    RelationshipTypes(Vec<RelationshipType>),
    Relationships(Vec<Relationship>),
    BusinessPatterns(Vec<BusinessPattern>),
    ReasoningTemplates(Vec<ReasoningTemplate>),
    MultihopQuestions(Vec<MultihopQuestion>),
    QuestionTemplates(QuestionTemplates),
    BusinessRules(Vec<BusinessRule>),
    ValidationRules(ValidationRules),
}

impl SectionPayload {
    pub fn name(&self) -> SectionName {
        match self {
            SectionPayload::Entities(_) => SectionName::Entities,
            SectionPayload::KeyTerms(_) => SectionName::KeyTerms,
            SectionPayload::EntityAliases(_) => SectionName::EntityAliases,
            SectionPayload::ExtractionPatterns(_) => SectionName::ExtractionPatterns,
            SectionPayload::BusinessContext(_) => SectionName::BusinessContext,
            SectionPayload::RelationshipTypes(_) => SectionName::RelationshipTypes,
            SectionPayload::Relationships(_) => SectionName::Relationships,
            SectionPayload::BusinessPatterns(_) => SectionName::BusinessPatterns,
            SectionPayload::ReasoningTemplates(_) => SectionName::ReasoningTemplates,
            SectionPayload::MultihopQuestions(_) => SectionName::MultihopQuestions,
            SectionPayload::QuestionTemplates(_) => SectionName::QuestionTemplates,
            SectionPayload::BusinessRules(_) => SectionName::BusinessRules,
            SectionPayload::ValidationRules(_) => SectionName::ValidationRules,
        }
    }

    /// Empty payload for a section written as `null`
    pub fn empty(name: SectionName) -> Self {
        match name {
            SectionName::Entities => SectionPayload::Entities(Vec::new()),
            SectionName::KeyTerms => SectionPayload::KeyTerms(Vec::new()),
            SectionName::EntityAliases => SectionPayload::EntityAliases(BTreeMap::new()),
            SectionName::ExtractionPatterns => SectionPayload::ExtractionPatterns(Vec::new()),
            SectionName::BusinessContext => SectionPayload::BusinessContext(BusinessContext::default()),
            SectionName::RelationshipTypes => SectionPayload::RelationshipTypes(Vec::new()),
            SectionName::Relationships => SectionPayload::Relationships(Vec::new()),
            SectionName::BusinessPatterns => SectionPayload::BusinessPatterns(Vec::new()),
            SectionName::ReasoningTemplates => SectionPayload::ReasoningTemplates(Vec::new()),
            SectionName::MultihopQuestions => SectionPayload::MultihopQuestions(Vec::new()),
            SectionName::QuestionTemplates => {
                SectionPayload::QuestionTemplates(QuestionTemplates::default())
            }
            SectionName::BusinessRules => SectionPayload::BusinessRules(Vec::new()),
            SectionName::ValidationRules => SectionPayload::ValidationRules(ValidationRules::default()),
        }
    }

    /// Identifying keys of the records in keyed sections
    ///
    /// `None` for sections whose records have no identity.
    pub fn record_keys(&self) -> Option<Vec<&str>> {
        let keys: Vec<&str> = match self {
            SectionPayload::Entities(items) => items.iter().map(|e| e.name.as_str()).collect(),
            SectionPayload::Relationships(items) => items.iter().map(|r| r.name.as_str()).collect(),
            SectionPayload::RelationshipTypes(items) => {
                items.iter().map(|t| t.relationship_type.as_str()).collect()
            }
            SectionPayload::BusinessPatterns(items) => items.iter().map(|p| p.name.as_str()).collect(),
            SectionPayload::ReasoningTemplates(items) => {
                items.iter().map(|t| t.name.as_str()).collect()
            }
            SectionPayload::BusinessRules(items) => items.iter().map(|r| r.name.as_str()).collect(),
            SectionPayload::EntityAliases(map) => map.keys().map(String::as_str).collect(),
            _ => return None,
        };
        Some(keys)
    }
}

/// Name of the field that identifies a record in a keyed section
///
/// `entity_aliases` is keyed by its mapping keys and has no such field.
pub fn key_field(section: SectionName) -> Option<&'static str> {
    match section {
        SectionName::Entities
        | SectionName::Relationships
        | SectionName::BusinessPatterns
        | SectionName::ReasoningTemplates
        | SectionName::BusinessRules => Some("name"),
        SectionName::RelationshipTypes => Some("type"),
        _ => None,
    }
}

/// Whether records of `section` are addressed by a key
pub fn is_keyed(section: SectionName) -> bool {
    key_field(section).is_some() || section == SectionName::EntityAliases
}

/// Validate one section subtree against that section's schema
///
/// A `null` subtree is a present, empty section.
pub fn validate_section(
    name: SectionName,
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<SectionPayload> {
    if value.is_null() {
        return Some(SectionPayload::empty(name));
    }
    match name {
        SectionName::Entities => validate_entities(value, path, errors).map(SectionPayload::Entities),
        SectionName::KeyTerms => validate_key_terms(value, path, errors).map(SectionPayload::KeyTerms),
        SectionName::EntityAliases => {
            validate_entity_aliases(value, path, errors).map(SectionPayload::EntityAliases)
        }
        SectionName::ExtractionPatterns => {
            validate_extraction_patterns(value, path, errors).map(SectionPayload::ExtractionPatterns)
        }
        SectionName::BusinessContext => {
            validate_business_context(value, path, errors).map(SectionPayload::BusinessContext)
        }
        SectionName::RelationshipTypes => {
            validate_relationship_types(value, path, errors).map(SectionPayload::RelationshipTypes)
        }
        SectionName::Relationships => {
            validate_relationships(value, path, errors).map(SectionPayload::Relationships)
        }
        SectionName::BusinessPatterns => {
            validate_business_patterns(value, path, errors).map(SectionPayload::BusinessPatterns)
        }
        SectionName::ReasoningTemplates => {
            validate_reasoning_templates(value, path, errors).map(SectionPayload::ReasoningTemplates)
        }
        SectionName::MultihopQuestions => {
            validate_multihop_questions(value, path, errors).map(SectionPayload::MultihopQuestions)
        }
        SectionName::QuestionTemplates => {
            validate_question_templates(value, path, errors).map(SectionPayload::QuestionTemplates)
        }
        SectionName::BusinessRules => {
            validate_business_rules(value, path, errors).map(SectionPayload::BusinessRules)
        }
        SectionName::ValidationRules => {
            validate_validation_rules(value, path, errors).map(SectionPayload::ValidationRules)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_section_is_empty_payload() {
        let mut errors = Vec::new();
        let payload = validate_section(
            SectionName::Relationships,
            &Value::Null,
            &FieldPath::field("relationships"),
            &mut errors,
        )
        .unwrap();
        assert_eq!(payload, SectionPayload::Relationships(Vec::new()));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_payload_names_match_sections() {
        for name in SectionName::ALL {
            assert_eq!(SectionPayload::empty(name).name(), name);
        }
    }

    #[test]
    fn test_record_keys() {
        let value: Value =
            serde_yaml::from_str("- {type: GOVERNS, business_context: {}}\n").unwrap();
        let mut errors = Vec::new();
        let payload = validate_section(
            SectionName::RelationshipTypes,
            &value,
            &FieldPath::field("relationship_types"),
            &mut errors,
        )
        .unwrap();
        assert_eq!(payload.record_keys(), Some(vec!["GOVERNS"]));
        assert_eq!(SectionPayload::empty(SectionName::KeyTerms).record_keys(), None);
        assert!(is_keyed(SectionName::EntityAliases));
        assert!(!is_keyed(SectionName::KeyTerms));
    }

    #[test]
    fn test_wrong_container_type() {
        let value: Value = serde_yaml::from_str("name: not a list\n").unwrap();
        let mut errors = Vec::new();
        assert!(validate_section(
            SectionName::Entities,
            &value,
            &FieldPath::field("entities"),
            &mut errors
        )
        .is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "expected sequence, found mapping");
    }
}
