//! `extraction_patterns` section

use domain_pack_core::FieldPath;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::reader::{read_seq, read_str, read_unit_interval, Issues, Record};

/// Pattern that extracts one attribute of one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPattern {
    pub pattern: String,
    pub entity_type: String,
    pub attribute: String,
    pub confidence: f64,
}

impl ExtractionPattern {
    pub const FIELDS: &'static [&'static str] = &["pattern", "entity_type", "attribute", "confidence"];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let pattern = record.required("pattern", read_str);
        let entity_type = record.required("entity_type", read_str);
        let attribute = record.required("attribute", read_str);
        let confidence = record.required("confidence", read_unit_interval);
        if !record.finish() {
            return None;
        }
        Some(Self {
            pattern: pattern?,
            entity_type: entity_type?,
            attribute: attribute?,
            confidence: confidence?,
        })
    }

    /// Whether `pattern` compiles as a regular expression
    pub fn compiles(&self) -> bool {
        regex::Regex::new(&self.pattern).is_ok()
    }
}

pub fn validate_extraction_patterns(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<Vec<ExtractionPattern>> {
    read_seq(value, path, errors, ExtractionPattern::read)
}
