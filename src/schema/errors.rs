//! Schema error types
//!
//! Raised when attribute-type metadata needed by an evaluator cannot be
//! resolved. Evaluators wrap these into evaluation errors.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema resolution errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Unknown attribute type: {0}")]
    UnknownAttributeType(String),

    #[error("Attribute type {attribute} has no syntax")]
    MissingSyntax { attribute: String },

    #[error("Attribute type {attribute} references unknown syntax {syntax}")]
    UnknownSyntax { attribute: String, syntax: String },

    #[error("Attribute type {attribute} references unknown matching rule {rule}")]
    UnknownMatchingRule { attribute: String, rule: String },

    #[error("Duplicate schema element: {0}")]
    Duplicate(String),

    #[error("Malformed schema {origin}: {reason}")]
    Malformed { origin: String, reason: String },
}

impl SchemaError {
    pub fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::UnknownMatchingRule {
            attribute: "cn".to_string(),
            rule: "fuzzyMatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Attribute type cn references unknown matching rule fuzzyMatch"
        );
    }
}
