//! Validation pipeline
//!
//! raw text → parse → document schema → warnings → verdict.
//!
//! The pipeline holds only its options. Identical input always yields an
//! identical verdict.
//!
//! # Example
//!
//! ```
//! use domain_pack_config::domain::{ValidationOptions, ValidationPipeline};
//!
//! let pipeline = ValidationPipeline::new(ValidationOptions::default());
//! let verdict = pipeline.validate("name: Legal\ndescription: Legal domain\nversion: 3.0.0\n");
//! assert!(verdict.is_valid);
//! ```

use domain_pack_core::{FieldPath, SectionName, ValidationVerdict, ValidationWarning};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::canonical::yaml_to_json;
use super::document::{items, known_entities, DocumentSchema, DomainConfigDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Derive non-blocking warnings
    pub include_warnings: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            include_warnings: true,
        }
    }
}

impl ValidationOptions {
    pub fn with_warnings(mut self, include: bool) -> Self {
        self.include_warnings = include;
        self
    }
}

/// Document that passed validation
///
/// Only the pipeline constructs these, so holding one proves the verdict was
/// valid.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    document: DomainConfigDocument,
    tree: Value,
}

impl ValidatedDocument {
    pub fn document(&self) -> &DomainConfigDocument {
        &self.document
    }

    pub fn into_document(self) -> DomainConfigDocument {
        self.document
    }

    /// Parsed tree as written
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Whole document in canonical JSON form
    pub fn canonical_json(&self) -> serde_json::Value {
        yaml_to_json(&self.tree)
    }

    /// Present sections only, in canonical JSON form
    pub fn section_trees(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut out = serde_json::Map::new();
        for name in SectionName::ALL {
            if let Some(value) = self.tree.get(name.as_str()) {
                out.insert(name.as_str().to_string(), yaml_to_json(value));
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub verdict: ValidationVerdict,
    pub document: Option<ValidatedDocument>,
}

impl ValidationOutcome {
    pub fn into_validated(self) -> Result<ValidatedDocument, ValidationVerdict> {
        match self.document {
            Some(document) => Ok(document),
            None => Err(self.verdict),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationPipeline {
    options: ValidationOptions,
}

impl ValidationPipeline {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    pub fn validate(&self, raw_text: &str) -> ValidationVerdict {
        self.validate_document(raw_text).verdict
    }

    pub fn validate_document(&self, raw_text: &str) -> ValidationOutcome {
        let tree = match parse(raw_text) {
            Ok(tree) => tree,
            Err(message) => {
                tracing::debug!(error = %message, "Domain pack failed to parse");
                return ValidationOutcome {
                    verdict: ValidationVerdict::parse_failure(message),
                    document: None,
                };
            }
        };

        let mut errors = Vec::new();
        let document = DocumentSchema::validate(&tree, &mut errors);
        let warnings = if self.options.include_warnings {
            warnings(&tree)
        } else {
            Vec::new()
        };

        let verdict = ValidationVerdict::from_parts(errors, warnings);
        tracing::debug!(summary = %verdict.summary(), "Domain pack validated");

        let document = match document {
            Some(document) if verdict.is_valid => Some(ValidatedDocument { document, tree }),
            _ => None,
        };
        ValidationOutcome { verdict, document }
    }
}

/// Parse raw text into a mapping root
///
/// Empty input is an empty mapping. Any other non-mapping root is a parse
/// failure.
fn parse(raw_text: &str) -> Result<Value, String> {
    if raw_text.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    let mut tree: Value =
        serde_yaml::from_str(raw_text).map_err(|e| format!("invalid YAML: {}", e))?;
    tree.apply_merge()
        .map_err(|e| format!("invalid YAML merge key: {}", e))?;
    match tree {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(tree),
        other => Err(format!(
            "document root must be a mapping, found {}",
            super::reader::kind_of(&other)
        )),
    }
}

fn warnings(root: &Value) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for name in SectionName::ALL {
        let empty = match root.get(name.as_str()) {
            Some(Value::Null) => true,
            Some(Value::Sequence(seq)) => seq.is_empty(),
            Some(Value::Mapping(map)) => map.is_empty(),
            _ => false,
        };
        if empty {
            warnings.push(ValidationWarning::new(
                FieldPath::field(name.as_str()),
                format!("Section '{}' is present but empty", name),
            ));
        }
    }

    let known = known_entities(root);
    let base = FieldPath::field(SectionName::ExtractionPatterns.as_str());
    for (i, item) in items(root, SectionName::ExtractionPatterns) {
        if let Some(pattern) = item.get("pattern").and_then(Value::as_str) {
            if regex::Regex::new(pattern).is_err() {
                warnings.push(ValidationWarning::new(
                    base.index(i).key("pattern"),
                    "pattern is not a valid regular expression",
                ));
            }
        }
        if known.is_empty() {
            continue;
        }
        if let Some(entity_type) = item.get("entity_type").and_then(Value::as_str) {
            if !known.contains(entity_type) {
                warnings.push(ValidationWarning::new(
                    base.index(i).key("entity_type"),
                    format!("entity_type '{}' matches no entity", entity_type),
                ));
            }
        }
    }

    if !known.is_empty() {
        let base = FieldPath::field(SectionName::EntityAliases.as_str());
        if let Some(Value::Mapping(aliases)) = root.get(SectionName::EntityAliases.as_str()) {
            for key in aliases.keys().filter_map(Value::as_str) {
                if !known.contains(key) {
                    warnings.push(ValidationWarning::new(
                        base.key(key),
                        format!("alias key '{}' matches no entity", key),
                    ));
                }
            }
        }
    }

    warnings
}
