//! Store and index error types
//!
//! Passed through the search engine verbatim.

use thiserror::Error;

use super::entry::EntryId;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Entry store and index errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    #[error("Index on {attribute} unavailable: {reason}")]
    IndexUnavailable { attribute: String, reason: String },

    #[error("Store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn index_unavailable(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::IndexUnavailable {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure concerns a single missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::NotFound(EntryId::new(42)).to_string(),
            "Entry not found: 42"
        );
        assert!(StoreError::index_unavailable("cn", "no reverse half")
            .to_string()
            .contains("cn"));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(StoreError::NotFound(EntryId::new(1)).is_not_found());
        assert!(!StoreError::Backend("disk".to_string()).is_not_found());
    }
}
