//! Section names
//!
//! The 13 optional sections of a domain pack, in canonical document order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Entities,
    KeyTerms,
    EntityAliases,
    ExtractionPatterns,
    BusinessContext,
    RelationshipTypes,
    Relationships,
    BusinessPatterns,
    ReasoningTemplates,
    MultihopQuestions,
    QuestionTemplates,
    BusinessRules,
    ValidationRules,
}

impl SectionName {
    pub const ALL: [SectionName; 13] = [
        SectionName::Entities,
        SectionName::KeyTerms,
        SectionName::EntityAliases,
        SectionName::ExtractionPatterns,
        SectionName::BusinessContext,
        SectionName::RelationshipTypes,
        SectionName::Relationships,
        SectionName::BusinessPatterns,
        SectionName::ReasoningTemplates,
        SectionName::MultihopQuestions,
        SectionName::QuestionTemplates,
        SectionName::BusinessRules,
        SectionName::ValidationRules,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionName::Entities => "entities",
            SectionName::KeyTerms => "key_terms",
            SectionName::EntityAliases => "entity_aliases",
            SectionName::ExtractionPatterns => "extraction_patterns",
            SectionName::BusinessContext => "business_context",
            SectionName::RelationshipTypes => "relationship_types",
            SectionName::Relationships => "relationships",
            SectionName::BusinessPatterns => "business_patterns",
            SectionName::ReasoningTemplates => "reasoning_templates",
            SectionName::MultihopQuestions => "multihop_questions",
            SectionName::QuestionTemplates => "question_templates",
            SectionName::BusinessRules => "business_rules",
            SectionName::ValidationRules => "validation_rules",
        }
    }

    pub fn parse_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == key)
    }

    /// Whether the section is a list of records (as opposed to a mapping)
    pub fn is_sequence(&self) -> bool {
        !matches!(
            self,
            SectionName::EntityAliases
                | SectionName::BusinessContext
                | SectionName::QuestionTemplates
                | SectionName::ValidationRules
        )
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_key(s).ok_or_else(|| Error::UnknownSection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for section in SectionName::ALL {
            assert_eq!(section.as_str().parse::<SectionName>().unwrap(), section);
        }
        assert!("entity".parse::<SectionName>().is_err());
    }

    #[test]
    fn test_serde_uses_section_keys() {
        let json = serde_json::to_string(&SectionName::ReasoningTemplates).unwrap();
        assert_eq!(json, "\"reasoning_templates\"");
    }

    #[test]
    fn test_mapping_sections() {
        assert!(SectionName::Entities.is_sequence());
        assert!(SectionName::KeyTerms.is_sequence());
        assert!(!SectionName::EntityAliases.is_sequence());
        assert!(!SectionName::ValidationRules.is_sequence());
    }
}
