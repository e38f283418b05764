//! Relationship sections: `relationship_types`, `relationships`

use domain_pack_core::FieldPath;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::reader::{read_json_map, read_seq, read_str, read_str_list, Issues, Record};

/// Relationship type with free-form business context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipType {
    #[serde(rename = "type")]
    pub relationship_type: String,
    pub business_context: serde_json::Map<String, serde_json::Value>,
}

impl RelationshipType {
    pub const FIELDS: &'static [&'static str] = &["type", "business_context"];

    /// Keys inside `business_context` that name entities
    pub const ENTITY_KEYS: &'static [&'static str] = &["from", "to", "entities_involved"];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let relationship_type = record.required("type", read_str);
        let business_context = record.required("business_context", read_json_map);
        if !record.finish() {
            return None;
        }
        Some(Self {
            relationship_type: relationship_type?,
            business_context: business_context?,
        })
    }
}

/// Directed relationship between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub from: String,
    pub to: String,
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
}

impl Relationship {
    pub const FIELDS: &'static [&'static str] = &["name", "from", "to", "attributes", "synonyms"];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let name = record.required("name", read_str);
        let from = record.required("from", read_str);
        let to = record.required("to", read_str);
        let attributes = record.required("attributes", read_str_list);
        let synonyms = record.optional("synonyms", read_str_list);
        if !record.finish() {
            return None;
        }
        Some(Self {
            name: name?,
            from: from?,
            to: to?,
            attributes: attributes?,
            synonyms,
        })
    }
}

pub fn validate_relationship_types(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Vec<RelationshipType>> {
    read_seq(value, path, errors, RelationshipType::read)
}

pub fn validate_relationships(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Vec<Relationship>> {
    read_seq(value, path, errors, Relationship::read)
}
