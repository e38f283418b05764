//! Question sections: `multihop_questions`, `question_templates`

use domain_pack_core::FieldPath;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::reader::{read_seq, read_str, read_str_list, Issues, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultihopQuestion {
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    pub priority: String,
    pub reasoning_type: String,
}

impl MultihopQuestion {
    pub const FIELDS: &'static [&'static str] = &["template", "examples", "priority", "reasoning_type"];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let template = record.required("template", read_str);
        let examples = record.optional("examples", read_str_list);
        let priority = record.required("priority", read_str);
        let reasoning_type = record.required("reasoning_type", read_str);
        if !record.finish() {
            return None;
        }
        Some(Self {
            template: template?,
            examples,
            priority: priority?,
            reasoning_type: reasoning_type?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_pairs: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    pub priority: String,
    pub expected_answer_type: String,
}

impl QuestionTemplate {
    pub const FIELDS: &'static [&'static str] = &[
        "template",
        "entity_types",
        "entity_pairs",
        "process_types",
        "financial_types",
        "attributes",
        "priority",
        "expected_answer_type",
    ];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let template = record.required("template", read_str);
        let entity_types = record.optional("entity_types", read_str_list);
        let entity_pairs = record.optional("entity_pairs", |v, p, e| read_seq(v, p, e, read_str_list));
        let process_types = record.optional("process_types", read_str_list);
        let financial_types = record.optional("financial_types", read_str_list);
        let attributes = record.optional("attributes", read_str_list);
        let priority = record.required("priority", read_str);
        let expected_answer_type = record.required("expected_answer_type", read_str);
        if !record.finish() {
            return None;
        }
        Some(Self {
            template: template?,
            entity_types,
            entity_pairs,
            process_types,
            financial_types,
            attributes,
            priority: priority?,
            expected_answer_type: expected_answer_type?,
        })
    }
}

/// Question templates grouped by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionTemplates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_extraction: Option<Vec<QuestionTemplate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_extraction: Option<Vec<QuestionTemplate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_process: Option<Vec<QuestionTemplate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_extraction: Option<Vec<QuestionTemplate>>,
}

impl QuestionTemplates {
    pub const FIELDS: &'static [&'static str] = &[
        "entity_extraction",
        "relationship_extraction",
        "business_process",
        "financial_extraction",
    ];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let category = |v: &Value, p: &FieldPath, e: &mut Issues| read_seq(v, p, e, QuestionTemplate::read);
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let templates = Self {
            entity_extraction: record.optional("entity_extraction", category),
            relationship_extraction: record.optional("relationship_extraction", category),
            business_process: record.optional("business_process", category),
            financial_extraction: record.optional("financial_extraction", category),
        };
        record.finish().then_some(templates)
    }
}

pub fn validate_multihop_questions(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Vec<MultihopQuestion>> {
    read_seq(value, path, errors, MultihopQuestion::read)
}

pub fn validate_question_templates(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<QuestionTemplates> {
    QuestionTemplates::read(value, path, errors)
}
