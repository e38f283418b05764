//! Domain pack schemas and validation
//!
//! - `reader`: strict typed reads over untyped YAML
//! - one module per section family, each owning its section schemas
//! - `section`: the [`SectionPayload`] sum type and section dispatch
//! - `document`: the document schema with cross-section reference checks
//! - `validator`: the validation pipeline and warnings
//! - `canonical`: YAML to JSON conversion for stored documents

mod reader;

pub mod business;
pub mod canonical;
pub mod document;
pub mod entities;
pub mod extraction_patterns;
pub mod questions;
pub mod reasoning;
pub mod relationships;
pub mod section;
pub mod validation_rules;
pub mod validator;

pub use business::{BusinessContext, BusinessPattern, BusinessRule};
pub use canonical::yaml_to_json;
pub use document::{DocumentSchema, DomainConfigDocument, METADATA_FIELDS};
pub use entities::Entity;
pub use extraction_patterns::ExtractionPattern;
pub use reader::Issues;
pub use questions::{MultihopQuestion, QuestionTemplate, QuestionTemplates};
pub use reasoning::ReasoningTemplate;
pub use relationships::{Relationship, RelationshipType};
pub use section::{is_keyed, key_field, validate_section, SectionPayload};
pub use validation_rules::ValidationRules;
pub use validator::{ValidatedDocument, ValidationOptions, ValidationOutcome, ValidationPipeline};
