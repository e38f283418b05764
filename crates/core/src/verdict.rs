//! Validation verdicts
//!
//! A verdict is produced once per validation or interpretation call and is
//! never merged with another.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::FieldPath;

/// Error kind surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Raw text is not well-formed
    ParseError,
    /// Field-level schema violation
    SchemaValidationError,
    /// Dangling entity reference
    CrossReferenceError,
    /// Interpreted intent does not satisfy the intent contract
    IntentSchemaError,
    /// Intent conflicts with the current document
    SemanticCollision,
    /// Missing or invalid provider credentials
    LlmConfigurationError,
    /// Transport or provider failure
    LlmApiError,
    /// Repair budget exhausted
    LlmOutputInvalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "PARSE_ERROR",
            ErrorKind::SchemaValidationError => "SCHEMA_VALIDATION_ERROR",
            ErrorKind::CrossReferenceError => "CROSS_REFERENCE_ERROR",
            ErrorKind::IntentSchemaError => "INTENT_SCHEMA_ERROR",
            ErrorKind::SemanticCollision => "SEMANTIC_COLLISION",
            ErrorKind::LlmConfigurationError => "LLM_CONFIGURATION_ERROR",
            ErrorKind::LlmApiError => "LLM_API_ERROR",
            ErrorKind::LlmOutputInvalid => "LLM_OUTPUT_INVALID",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-friendly reason for a single issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    MissingField,
    UnknownField,
    TypeMismatch,
    OutOfRange,
    EmptyValue,
    InvalidFormat,
    Duplicate,
    DanglingReference,
    NotApplicable,
    Malformed,
    /// Provider call failed or timed out
    ProviderFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: FieldPath,
    pub message: String,
    pub kind: ErrorKind,
    pub code: ViolationCode,
}

impl ValidationIssue {
    pub fn new(
        kind: ErrorKind,
        code: ViolationCode,
        path: FieldPath,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
            code,
        }
    }

    /// Schema violation at `path`
    pub fn schema(code: ViolationCode, path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaValidationError, code, path, message)
    }

    /// Dangling entity reference at `path`
    pub fn dangling(path: FieldPath, reference: &str) -> Self {
        Self::new(
            ErrorKind::CrossReferenceError,
            ViolationCode::DanglingReference,
            path,
            format!("references unknown entity '{}'", reference),
        )
    }

    /// Same issue under a different kind
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: FieldPath,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Outcome of one validation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationVerdict {
    /// Valid iff `errors` is empty
    pub fn from_parts(errors: Vec<ValidationIssue>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Single `PARSE_ERROR` and nothing else
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::from_parts(
            vec![ValidationIssue::new(
                ErrorKind::ParseError,
                ViolationCode::Malformed,
                FieldPath::root(),
                message,
            )],
            Vec::new(),
        )
    }

    pub fn errors_of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors_of_kind(kind).next().is_some()
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        if self.is_valid {
            format!("valid ({} warnings)", self.warnings.len())
        } else {
            format!(
                "invalid: {} errors, {} warnings",
                self.errors.len(),
                self.warnings.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_follows_errors() {
        let verdict = ValidationVerdict::from_parts(
            Vec::new(),
            vec![ValidationWarning::new(FieldPath::field("entities"), "empty")],
        );
        assert!(verdict.is_valid);
        assert_eq!(verdict.summary(), "valid (1 warnings)");

        let verdict = ValidationVerdict::parse_failure("bad indentation");
        assert!(!verdict.is_valid);
        assert_eq!(verdict.errors.len(), 1);
        assert!(verdict.has_kind(ErrorKind::ParseError));
    }

    #[test]
    fn test_issue_serialization() {
        let issue = ValidationIssue::dangling(
            FieldPath::field("relationships").index(0).key("from"),
            "Court",
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["path"], "relationships.0.from");
        assert_eq!(json["kind"], "CROSS_REFERENCE_ERROR");
        assert_eq!(json["code"], "dangling_reference");
    }

    #[test]
    fn test_kind_strings_match_serde() {
        for kind in [
            ErrorKind::ParseError,
            ErrorKind::SemanticCollision,
            ErrorKind::LlmApiError,
            ErrorKind::LlmOutputInvalid,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }
}
