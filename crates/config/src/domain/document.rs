//! Document schema
//!
//! Composes the section schemas into one contract:
//! - `name`, `description` and `version` are required and non-empty
//! - every present section satisfies its own schema
//! - entity references in `relationships`, `business_patterns` and
//!   `relationship_types` resolve against `entities`
//!
//! All three phases always run and report into the same error list.

use std::collections::{BTreeMap, HashSet};

use domain_pack_core::{is_semver, FieldPath, SectionName, ValidationIssue, ViolationCode};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::entities::Entity;
use super::reader::{read_str, Issues, Record};
use super::relationships::RelationshipType;
use super::section::{validate_section, SectionPayload};

pub const METADATA_FIELDS: [&str; 3] = ["name", "description", "version"];

static TOP_LEVEL_FIELDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    METADATA_FIELDS
        .iter()
        .copied()
        .chain(SectionName::ALL.iter().map(|s| s.as_str()))
        .collect()
});

/// Validated domain pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfigDocument {
    pub name: String,
    pub description: String,
    pub version: String,
    pub sections: BTreeMap<SectionName, SectionPayload>,
}

impl DomainConfigDocument {
    pub fn section(&self, name: SectionName) -> Option<&SectionPayload> {
        self.sections.get(&name)
    }

    pub fn entities(&self) -> &[Entity] {
        match self.sections.get(&SectionName::Entities) {
            Some(SectionPayload::Entities(entities)) => entities,
            _ => &[],
        }
    }

    /// Whether `reference` names an entity by name or type
    pub fn knows_entity(&self, reference: &str) -> bool {
        self.entities()
            .iter()
            .any(|e| e.name == reference || e.entity_type == reference)
    }

    /// Present sections in canonical order
    pub fn present_sections(&self) -> Vec<SectionName> {
        self.sections.keys().copied().collect()
    }

    pub fn sections_count(&self) -> usize {
        self.sections.len()
    }

    /// Whether a keyed section holds a record with `key`
    pub fn has_record(&self, section: SectionName, key: &str) -> bool {
        self.section(section)
            .and_then(SectionPayload::record_keys)
            .map(|keys| keys.contains(&key))
            .unwrap_or(false)
    }
}

pub struct DocumentSchema;

impl DocumentSchema {
    /// Validate a parsed root, returning the typed document when no error was
    /// added.
    pub fn validate(root: &Value, errors: &mut Issues) -> Option<DomainConfigDocument> {
        let start = errors.len();
        let metadata = Self::metadata(root, errors);

        let mut sections = BTreeMap::new();
        for name in SectionName::ALL {
            if let Some(value) = root.get(name.as_str()) {
                if let Some(payload) =
                    validate_section(name, value, &FieldPath::field(name.as_str()), errors)
                {
                    sections.insert(name, payload);
                }
            }
        }

        errors.extend(Self::cross_references(root));

        let (name, description, version) = metadata?;
        (errors.len() == start).then_some(DomainConfigDocument {
            name,
            description,
            version,
            sections,
        })
    }

    /// Required metadata, plus unknown top-level keys
    fn metadata(root: &Value, errors: &mut Issues) -> Option<(String, String, String)> {
        let mut record = Record::open(root, &FieldPath::root(), &TOP_LEVEL_FIELDS, errors)?;
        let name = record.required("name", read_str);
        let description = record.required("description", read_str);
        let version = record.required("version", |v, p, e| {
            let version = read_str(v, p, e)?;
            if is_semver(&version) {
                Some(version)
            } else {
                e.push(ValidationIssue::schema(
                    ViolationCode::InvalidFormat,
                    p.clone(),
                    format!(
                        "must be a semantic version (MAJOR.MINOR.PATCH), found '{}'",
                        version
                    ),
                ));
                None
            }
        });
        record.finish();
        Some((name?, description?, version?))
    }

    /// Entity references that do not resolve
    ///
    /// Reads the raw tree, so references are checked even inside records
    /// that failed their own schema.
    pub fn cross_references(root: &Value) -> Vec<ValidationIssue> {
        let known = known_entities(root);
        let mut errors = Vec::new();
        let mut check = |value: Option<&Value>, path: FieldPath| {
            if let Some(reference) = value.and_then(Value::as_str) {
                if !reference.trim().is_empty() && !known.contains(reference) {
                    errors.push(ValidationIssue::dangling(path, reference));
                }
            }
        };

        let base = FieldPath::field(SectionName::Relationships.as_str());
        for (i, item) in items(root, SectionName::Relationships) {
            check(item.get("from"), base.index(i).key("from"));
            check(item.get("to"), base.index(i).key("to"));
        }

        let base = FieldPath::field(SectionName::BusinessPatterns.as_str());
        for (i, item) in items(root, SectionName::BusinessPatterns) {
            let path = base.index(i).key("entities_involved");
            for (j, reference) in seq(item.get("entities_involved")) {
                check(Some(reference), path.index(j));
            }
        }

        let base = FieldPath::field(SectionName::RelationshipTypes.as_str());
        for (i, item) in items(root, SectionName::RelationshipTypes) {
            let Some(context) = item.get("business_context") else {
                continue;
            };
            let path = base.index(i).key("business_context");
            for key in RelationshipType::ENTITY_KEYS {
                match context.get(*key) {
                    Some(Value::Sequence(_)) => {
                        for (j, reference) in seq(context.get(*key)) {
                            check(Some(reference), path.key(*key).index(j));
                        }
                    }
                    other => check(other, path.key(*key)),
                }
            }
        }

        errors
    }
}

/// Every string `name` and `type` of the raw `entities` items
pub(crate) fn known_entities(root: &Value) -> HashSet<String> {
    let mut known = HashSet::new();
    for (_, item) in items(root, SectionName::Entities) {
        for key in ["name", "type"] {
            if let Some(s) = item.get(key).and_then(Value::as_str) {
                known.insert(s.to_string());
            }
        }
    }
    known
}

pub(crate) fn items(root: &Value, section: SectionName) -> impl Iterator<Item = (usize, &Value)> {
    seq(root.get(section.as_str()))
}

fn seq(value: Option<&Value>) -> impl Iterator<Item = (usize, &Value)> {
    value
        .and_then(Value::as_sequence)
        .into_iter()
        .flatten()
        .enumerate()
}
