//! Intent types
//!
//! An [`Intent`] describes one requested edit to a domain pack. The engine
//! never applies it.

use std::fmt;
use std::str::FromStr;

use domain_pack_config::DomainConfigDocument;
use domain_pack_core::{Error as CoreError, SectionName};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::IntentError;

/// Edit operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Add,
    #[serde(alias = "UPDATE")]
    Modify,
    #[serde(alias = "DELETE")]
    Remove,
    Merge,
    Split,
    Reorder,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Add,
        Operation::Modify,
        Operation::Remove,
        Operation::Merge,
        Operation::Split,
        Operation::Reorder,
    ];

    /// Case-insensitive; `UPDATE` and `DELETE` are aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ADD" => Some(Operation::Add),
            "MODIFY" | "UPDATE" => Some(Operation::Modify),
            "REMOVE" | "DELETE" => Some(Operation::Remove),
            "MERGE" => Some(Operation::Merge),
            "SPLIT" => Some(Operation::Split),
            "REORDER" => Some(Operation::Reorder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "ADD",
            Operation::Modify => "MODIFY",
            Operation::Remove => "REMOVE",
            Operation::Merge => "MERGE",
            Operation::Split => "SPLIT",
            Operation::Reorder => "REORDER",
        }
    }

    /// Operations that address a single record
    pub fn addresses_record(&self) -> bool {
        matches!(self, Operation::Add | Operation::Modify | Operation::Remove)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level metadata field an intent may target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Name,
    Description,
    Version,
}

impl MetadataField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataField::Name => "name",
            MetadataField::Description => "description",
            MetadataField::Version => "version",
        }
    }
}

/// What an intent edits: a metadata field or a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentTarget {
    Metadata(MetadataField),
    Section(SectionName),
}

impl IntentTarget {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "name" => Some(IntentTarget::Metadata(MetadataField::Name)),
            "description" => Some(IntentTarget::Metadata(MetadataField::Description)),
            "version" => Some(IntentTarget::Metadata(MetadataField::Version)),
            other => SectionName::parse_key(other).map(IntentTarget::Section),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentTarget::Metadata(field) => field.as_str(),
            IntentTarget::Section(section) => section.as_str(),
        }
    }

    pub fn section(&self) -> Option<SectionName> {
        match self {
            IntentTarget::Section(section) => Some(*section),
            IntentTarget::Metadata(_) => None,
        }
    }
}

impl fmt::Display for IntentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentTarget {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::UnknownTarget(s.to_string()))
    }
}

impl Serialize for IntentTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IntentTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionRisk {
    Low,
    Medium,
    High,
}

impl ExecutionRisk {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(ExecutionRisk::Low),
            "MEDIUM" => Some(ExecutionRisk::Medium),
            "HIGH" => Some(ExecutionRisk::High),
            _ => None,
        }
    }
}

/// Entity the request talks about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntentConstraints {
    #[serde(default = "default_true")]
    pub must_not_override_existing: bool,
    #[serde(default)]
    pub additional_constraints: Map<String, Value>,
}

impl Default for IntentConstraints {
    fn default() -> Self {
        Self {
            must_not_override_existing: true,
            additional_constraints: Map::new(),
        }
    }
}

/// Checks the downstream applier is asked to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationRequirements {
    #[serde(default = "default_true")]
    pub schema_validation: bool,
    #[serde(default = "default_true")]
    pub duplicate_check: bool,
    #[serde(default)]
    pub additional_validations: Map<String, Value>,
}

impl Default for ValidationRequirements {
    fn default() -> Self {
        Self {
            schema_validation: true,
            duplicate_check: true,
            additional_validations: Map::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One requested edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent_id: String,
    pub domain_pack_id: String,
    pub operation: Operation,
    pub target_section: IntentTarget,
    /// Address within the section: record key, then nested field names
    pub target_path: Vec<String>,
    /// Data stated in the request
    pub payload: Map<String, Value>,
    pub rationale: String,
    pub confidence: Option<f64>,
    pub execution_risk: Option<ExecutionRisk>,
    pub entities_involved: Vec<EntityRef>,
    /// Data the model inferred but the user did not state
    pub inferred: Map<String, Value>,
    pub constraints: IntentConstraints,
    pub validation_requirements: ValidationRequirements,
    pub assumptions: Vec<String>,
    pub ambiguities: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Intent {
    /// Record key addressed by `target_path`
    pub fn record_key(&self) -> Option<&str> {
        self.target_path.first().map(String::as_str)
    }
}

/// Input to one interpretation
#[derive(Debug, Clone)]
pub struct IntentContext {
    pub domain_pack_id: String,
    pub domain_name: String,
    pub description: String,
    pub user_request: String,
    /// Current pack, for collision checks
    pub current_document: Option<DomainConfigDocument>,
}

impl IntentContext {
    pub fn new(
        domain_pack_id: impl Into<String>,
        domain_name: impl Into<String>,
        description: impl Into<String>,
        user_request: impl Into<String>,
    ) -> Result<Self, IntentError> {
        let user_request = user_request.into();
        if user_request.trim().is_empty() {
            return Err(IntentError::EmptyRequest);
        }
        Ok(Self {
            domain_pack_id: domain_pack_id.into(),
            domain_name: domain_name.into(),
            description: description.into(),
            user_request,
            current_document: None,
        })
    }

    pub fn with_document(mut self, document: DomainConfigDocument) -> Self {
        self.current_document = Some(document);
        self
    }
}
