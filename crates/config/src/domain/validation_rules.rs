//! `validation_rules` section

use std::collections::BTreeMap;

use domain_pack_core::FieldPath;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::reader::{read_map, read_str_list, Issues, Record};

/// Fields each entity type must carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ValidationRules {
    pub const FIELDS: &'static [&'static str] = &["required_fields"];

    pub(crate) fn read(value: &Value, path: &FieldPath, errors: &mut Issues) -> Option<Self> {
        let mut record = Record::open(value, path, Self::FIELDS, errors)?;
        let required_fields =
            record.optional("required_fields", |v, p, e| read_map(v, p, e, read_str_list));
        record.finish().then_some(Self { required_fields })
    }
}

pub fn validate_validation_rules(
    value: &Value,
    path: &FieldPath,
    errors: &mut Issues,
) -> Option<ValidationRules> {
    ValidationRules::read(value, path, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields_per_type() {
        let value: Value =
            serde_yaml::from_str("required_fields:\n  CONTRACT: [parties, effective_date]\n").unwrap();
        let mut errors = Vec::new();
        let rules =
            validate_validation_rules(&value, &FieldPath::field("validation_rules"), &mut errors)
                .unwrap();
        assert_eq!(rules.required_fields.unwrap()["CONTRACT"].len(), 2);
    }

    #[test]
    fn test_required_fields_shape() {
        let value: Value = serde_yaml::from_str("required_fields: [parties]\n").unwrap();
        let mut errors = Vec::new();
        assert!(
            validate_validation_rules(&value, &FieldPath::field("validation_rules"), &mut errors)
                .is_none()
        );
        assert_eq!(errors[0].path.to_string(), "validation_rules.required_fields");
    }
}
