//! Entity sections: `entities`, `key_terms`, `entity_aliases`

use std::collections::{BTreeMap, HashSet};

use domain_pack_core::{FieldPath, ValidationIssue, ViolationCode};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::reader::{read_map, read_seq, read_str, read_str_list, Issues, Record};

/// Single entity definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
}

impl Entity {
    pub const FIELDS: &'static [&'static str] = &["name", "type", "attributes", "synonyms"];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let name = record.required("name", read_str);
        let entity_type = record.required("type", read_str);
        let attributes = record.required("attributes", read_str_list);
        let synonyms = record.optional("synonyms", read_str_list);
        if !record.finish() {
            return None;
        }
        Some(Self {
            name: name?,
            entity_type: entity_type?,
            attributes: attributes?,
            synonyms,
        })
    }
}

/// `entities`: a list of entities with unique names
pub fn validate_entities(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Vec<Entity>> {
    let entities = read_seq(value, path, errors, Entity::read);

    let mut seen = HashSet::new();
    let mut duplicates = false;
    for (i, item) in value.as_sequence().into_iter().flatten().enumerate() {
        if let Some(name) = item.get("name").and_then(Value::as_str) {
            if !seen.insert(name) {
                errors.push(ValidationIssue::schema(
                    ViolationCode::Duplicate,
                    path.index(i).key("name"),
                    format!("duplicate entity name '{}'", name),
                ));
                duplicates = true;
            }
        }
    }

    entities.filter(|_| !duplicates)
}

/// `key_terms`: a list of strings
pub fn validate_key_terms(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Vec<String>> {
    read_str_list(value, path, errors)
}

/// `entity_aliases`: entity type to alias list
pub fn validate_entity_aliases(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<BTreeMap<String, Vec<String>>> {
    read_map(value, path, errors, read_str_list)
}
