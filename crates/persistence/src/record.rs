//! Persistence records and the document builder

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain_pack_config::ValidatedDocument;
use domain_pack_core::{Clock, SystemClock};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
}

/// Stored form of one uploaded domain pack
///
/// `parsed_document` and `sections` hold the canonical JSON tree, so
/// numeric mapping keys appear as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceRecord {
    /// Assigned by the store on insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub filename: String,
    pub raw_text: String,
    pub parsed_document: serde_json::Value,
    pub metadata: DocumentMetadata,
    pub sections_count: usize,
    pub sections: serde_json::Map<String, serde_json::Value>,
    pub uploaded_at: DateTime<Utc>,
}

impl PersistenceRecord {
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// Builds persistence records from validated documents
///
/// Taking a [`ValidatedDocument`] means an invalid document cannot reach
/// the store.
#[derive(Clone)]
pub struct DocumentBuilder {
    clock: Arc<dyn Clock>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl DocumentBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn build(
        &self,
        raw_text: &str,
        validated: &ValidatedDocument,
        filename: &str,
    ) -> PersistenceRecord {
        let document = validated.document();
        PersistenceRecord {
            identifier: None,
            filename: filename.to_string(),
            raw_text: raw_text.to_string(),
            parsed_document: validated.canonical_json(),
            metadata: DocumentMetadata {
                name: document.name.clone(),
                description: document.description.clone(),
                version: document.version.clone(),
            },
            sections_count: document.sections_count(),
            sections: validated.section_trees(),
            uploaded_at: self.clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain_pack_config::ValidationPipeline;
    use domain_pack_core::FixedClock;

    const RAW: &str = r#"
name: Legal
description: Legal domain
version: 3.0.0
key_terms: [indemnity]
reasoning_templates:
  - name: Breach analysis
    steps: {1: Identify obligation, 2: Check performance}
    triggers: [breach]
    confidence_threshold: 0.7
"#;

    fn builder() -> (DocumentBuilder, DateTime<Utc>) {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        (DocumentBuilder::new(Arc::new(FixedClock::new(at))), at)
    }

    #[test]
    fn test_build_record() {
        let (builder, at) = builder();
        let validated = ValidationPipeline::default()
            .validate_document(RAW)
            .into_validated()
            .unwrap();
        let record = builder.build(RAW, &validated, "legal.yaml");

        assert!(record.identifier.is_none());
        assert_eq!(record.filename, "legal.yaml");
        assert_eq!(record.raw_text, RAW);
        assert_eq!(record.metadata.name, "Legal");
        assert_eq!(record.metadata.version, "3.0.0");
        assert_eq!(record.sections_count, 2);
        assert_eq!(record.uploaded_at, at);
        assert_eq!(
            record.sections.keys().collect::<Vec<_>>(),
            vec!["key_terms", "reasoning_templates"]
        );
        assert_eq!(
            record.parsed_document["reasoning_templates"][0]["steps"]["2"],
            "Check performance"
        );
    }

    #[test]
    fn test_metadata_only_pack_has_no_sections() {
        let (builder, _) = builder();
        let raw = "name: Legal\ndescription: Legal domain\nversion: 1.0.0\n";
        let validated = ValidationPipeline::default()
            .validate_document(raw)
            .into_validated()
            .unwrap();
        let record = builder.build(raw, &validated, "minimal.yml");
        assert_eq!(record.sections_count, 0);
        assert!(record.sections.is_empty());
    }

    #[test]
    fn test_identifier_skipped_until_assigned() {
        let (builder, _) = builder();
        let raw = "name: Legal\ndescription: Legal domain\nversion: 1.0.0\n";
        let validated = ValidationPipeline::default()
            .validate_document(raw)
            .into_validated()
            .unwrap();
        let record = builder.build(raw, &validated, "minimal.yml");

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("identifier").is_none());

        let stored = record.with_identifier("abc");
        let back: PersistenceRecord =
            serde_json::from_value(serde_json::to_value(&stored).unwrap()).unwrap();
        assert_eq!(back, stored);
    }
}
